use serde::Serialize;

use crate::models::health_log::HealthLog;

/// Most sleep that one long night can pay back, in hours.
const MAX_NIGHTLY_RECOVERY: f64 = 1.0;
const MAX_DEBT_HOURS: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepDebtStatus {
    Unknown,
    Rested,
    Mild,
    Moderate,
    Significant,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepDebtReport {
    pub debt_hours: f64,
    pub days_analyzed: usize,
    pub recovery_days: u32,
    pub status: SleepDebtStatus,
    pub message: String,
    pub recommendations: Vec<String>,
}

/// Accumulated sleep debt over the most recent `lookback_days` logs.
///
/// Short nights add their shortfall; long nights pay back at most an hour.
pub fn sleep_debt(logs: &[HealthLog], optimal_hours: f64, lookback_days: usize) -> SleepDebtReport {
    if logs.is_empty() {
        return SleepDebtReport {
            debt_hours: 0.0,
            days_analyzed: 0,
            recovery_days: 0,
            status: SleepDebtStatus::Unknown,
            message: "no sleep data available".into(),
            recommendations: recommendations(0.0),
        };
    }

    let mut recent: Vec<&HealthLog> = logs.iter().collect();
    recent.sort_by(|a, b| b.log_date.cmp(&a.log_date));
    recent.truncate(lookback_days);

    let raw: f64 = recent
        .iter()
        .map(|log| {
            let shortfall = optimal_hours - log.sleep_hours;
            if shortfall > 0.0 {
                shortfall
            } else {
                -shortfall.abs().min(MAX_NIGHTLY_RECOVERY)
            }
        })
        .sum();
    let debt = if raw > 0.0 { raw.min(MAX_DEBT_HOURS) } else { 0.0 };
    let recovery_days = debt.floor() as u32;

    let (status, message) = if debt == 0.0 {
        (SleepDebtStatus::Rested, "you're well rested".to_string())
    } else if debt < 5.0 {
        (
            SleepDebtStatus::Mild,
            format!("slight sleep debt ({debt:.1}h), easy to recover"),
        )
    } else if debt < 15.0 {
        (
            SleepDebtStatus::Moderate,
            format!("noticeable debt ({debt:.1}h), prioritize sleep this week"),
        )
    } else if debt < 25.0 {
        (
            SleepDebtStatus::Significant,
            format!("significant debt ({debt:.1}h), recovery will take ~{recovery_days} days"),
        )
    } else {
        (
            SleepDebtStatus::Severe,
            format!("severe debt ({debt:.1}h), consider talking to a doctor if you feel fatigued"),
        )
    };

    SleepDebtReport {
        debt_hours: (debt * 10.0).round() / 10.0,
        days_analyzed: recent.len(),
        recovery_days,
        status,
        message,
        recommendations: recommendations(debt),
    }
}

fn recommendations(debt_hours: f64) -> Vec<String> {
    let mut tips = vec!["keep consistent bed and wake times".to_string()];
    let extra: &[&str] = if debt_hours == 0.0 {
        &["you're doing great, keep it up"]
    } else if debt_hours < 5.0 {
        &["add 30 minutes of sleep tonight", "avoid screens before bed"]
    } else if debt_hours < 15.0 {
        &[
            "aim for 8-9 hours tonight",
            "skip caffeine after 2pm",
            "consider a 20 minute power nap",
        ]
    } else {
        &[
            "prioritize sleep over other activities",
            "keep your room dark and cool",
            "avoid alcohol, it disrupts sleep quality",
            "go to bed an hour earlier",
        ]
    };
    tips.extend(extra.iter().map(|t| t.to_string()));
    tips
}
