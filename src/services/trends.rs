use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::health_log::HealthLog;

/// Half-over-half change below which a metric counts as stable.
const STABLE_DELTA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrend {
    pub average: Option<f64>,
    pub first_half_avg: Option<f64>,
    pub second_half_avg: Option<f64>,
    pub trend: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub readiness: Option<i32>,
    pub sleep_hours: f64,
    pub energy: i32,
    pub stress: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub days: usize,
    pub data: Vec<TrendPoint>,
    pub readiness: MetricTrend,
    pub sleep: MetricTrend,
    pub energy: MetricTrend,
    pub stress: MetricTrend,
    pub message: String,
}

/// Direction of each tracked metric over the most recent `days` logs,
/// comparing the older half of the window with the newer half.
pub fn analyze_trends(logs: &[HealthLog], days: usize) -> TrendReport {
    let mut window: Vec<&HealthLog> = logs.iter().collect();
    window.sort_by(|a, b| b.log_date.cmp(&a.log_date));
    window.truncate(days);
    window.reverse();

    let data = window
        .iter()
        .map(|log| TrendPoint {
            date: log.log_date,
            readiness: log.readiness_score,
            sleep_hours: log.sleep_hours,
            energy: log.energy_level,
            stress: log.stress_level,
        })
        .collect::<Vec<_>>();

    let readiness = metric_trend(&window, |l| l.readiness_score.map(f64::from));
    let sleep = metric_trend(&window, |l| Some(l.sleep_hours));
    let energy = metric_trend(&window, |l| Some(f64::from(l.energy_level)));
    let stress = metric_trend(&window, |l| Some(f64::from(l.stress_level)));

    let message = if window.len() < 2 {
        "need more data for trend analysis"
    } else if readiness.trend == Direction::Up && energy.trend == Direction::Up {
        "your wellness is improving"
    } else if readiness.trend == Direction::Down && stress.trend == Direction::Up {
        "you seem more stressed lately"
    } else if stress.trend == Direction::Down {
        "stress levels are coming down"
    } else {
        "wellness is stable"
    };

    TrendReport {
        days: window.len(),
        data,
        readiness,
        sleep,
        energy,
        stress,
        message: message.to_string(),
    }
}

fn metric_trend(window: &[&HealthLog], value: impl Fn(&HealthLog) -> Option<f64>) -> MetricTrend {
    let average = |logs: &[&HealthLog]| {
        let values: Vec<f64> = logs.iter().filter_map(|l| value(*l)).collect();
        if values.is_empty() {
            None
        } else {
            Some(round1(values.iter().sum::<f64>() / values.len() as f64))
        }
    };

    if window.len() < 2 {
        return MetricTrend {
            average: average(window),
            first_half_avg: None,
            second_half_avg: None,
            trend: Direction::Stable,
        };
    }

    let (first, second) = window.split_at(window.len() / 2);
    let first_half_avg = average(first);
    let second_half_avg = average(second);
    let trend = match (first_half_avg, second_half_avg) {
        (Some(a), Some(b)) if (b - a).abs() >= STABLE_DELTA => {
            if b > a {
                Direction::Up
            } else {
                Direction::Down
            }
        }
        _ => Direction::Stable,
    };

    MetricTrend {
        average: average(window),
        first_half_avg,
        second_half_avg,
        trend,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakStatus {
    pub streak: u32,
    pub message: String,
}

/// Consecutive logged days ending at `today`.
pub fn logging_streak(logs: &[HealthLog], today: NaiveDate) -> StreakStatus {
    let mut dates: Vec<NaiveDate> = logs.iter().map(|l| l.log_date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let mut streak = 0u32;
    let mut expected = today;
    for date in dates.into_iter().skip_while(|d| *d > today) {
        if date != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }

    let message = match streak {
        30.. => format!("amazing {streak}-day streak!"),
        7..=29 => format!("great {streak}-day streak going"),
        3..=6 => format!("{streak} days in a row, keep it up"),
        1 => "logged today, building momentum".to_string(),
        2 => "2 days in a row".to_string(),
        _ => "no current streak".to_string(),
    };

    StreakStatus { streak, message }
}
