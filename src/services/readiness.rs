//! Readiness scoring.
//!
//! A day's readiness is a weighted composite of five normalized factors
//! (sleep, energy, stress, activity, consistency), banded into a zone and
//! explained with a few targeted suggestions. Scoring is a pure function of
//! today's log and the trailing window of prior logs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::models::calendar::days_before;
use crate::models::health_log::HealthLog;

const SLEEP_HOURS_SHARE: f64 = 0.6;
const MINUTES_SHARE: f64 = 0.6;
/// Average day-over-day sleep change (hours) that zeroes sleep stability.
const SLEEP_SWING_LIMIT: f64 = 4.0;
/// Average day-over-day stress change (points) that zeroes stress stability.
const STRESS_SWING_LIMIT: f64 = 5.0;
const HEAVY_CAFFEINE_CUPS: i32 = 4;

/// The inputs readiness scoring reads from a log.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub sleep_hours: f64,
    pub sleep_quality: i32,
    pub energy_level: i32,
    pub stress_level: i32,
    pub activity_minutes: i32,
    pub steps: i32,
    pub caffeine_cups: i32,
}

impl From<&HealthLog> for DailyMetrics {
    fn from(log: &HealthLog) -> Self {
        Self {
            date: log.log_date,
            sleep_hours: log.sleep_hours,
            sleep_quality: log.sleep_quality,
            energy_level: log.energy_level,
            stress_level: log.stress_level,
            activity_minutes: log.activity_minutes,
            steps: log.steps,
            caffeine_cups: log.caffeine_cups,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Low,
    Moderate,
    High,
}

impl Zone {
    pub fn summary(self) -> &'static str {
        match self {
            Zone::High => "you're well recovered and ready for a demanding day",
            Zone::Moderate => "take it a bit easier today",
            Zone::Low => "focus on recovery today",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Factor {
    Sleep,
    Energy,
    Stress,
    Activity,
    Consistency,
}

impl Factor {
    fn threshold(self) -> f64 {
        match self {
            Factor::Sleep => 0.6,
            Factor::Energy | Factor::Stress | Factor::Activity | Factor::Consistency => 0.5,
        }
    }

    fn suggestion(self, config: &ScoringConfig) -> String {
        match self {
            Factor::Sleep => format!(
                "aim for {}-{} hours of sleep tonight",
                config.sleep_target_min, config.sleep_target_max
            ),
            Factor::Energy => {
                "plan demanding work for your highest-energy hours and take short breaks".into()
            }
            Factor::Stress => "take a short walk or breathing break to bring stress down".into(),
            Factor::Activity => format!(
                "fit in about {} minutes of movement today",
                config.activity_target_minutes
            ),
            Factor::Consistency => {
                "keep bed and wake times steady, your sleep and stress have swung a lot lately"
                    .into()
            }
        }
    }
}

/// Derived readiness for one day. Never stored; recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessScore {
    pub score: i32,
    pub zone: Zone,
    pub sleep_factor: f64,
    pub energy_factor: f64,
    pub stress_factor: f64,
    pub activity_factor: f64,
    pub consistency_factor: f64,
    pub summary: String,
    pub suggestions: Vec<String>,
}

pub struct ReadinessScorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ReadinessScorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// `None` when there is no log for today: "not logged yet" is not a zero score.
    pub fn assess(
        &self,
        today: Option<&DailyMetrics>,
        history: &[DailyMetrics],
    ) -> Option<ReadinessScore> {
        today.map(|today| self.score(today, history))
    }

    pub fn score(&self, today: &DailyMetrics, history: &[DailyMetrics]) -> ReadinessScore {
        let sleep = self.sleep_factor(today.sleep_hours, today.sleep_quality);
        let energy = Self::energy_factor(today.energy_level);
        let stress = Self::stress_factor(today.stress_level);
        let activity = self.activity_factor(today.activity_minutes, today.steps);
        let consistency = self.consistency_factor(today, history);

        let factors = [sleep, energy, stress, activity, consistency];
        let composite: f64 = self
            .config
            .weights()
            .iter()
            .zip(factors.iter())
            .map(|(w, f)| w * f)
            .sum();
        let score = (composite * 100.0).round().clamp(0.0, 100.0) as i32;
        let zone = self.zone_for(score);

        let suggestions = self.suggestions(
            &[
                (Factor::Sleep, sleep),
                (Factor::Energy, energy),
                (Factor::Stress, stress),
                (Factor::Activity, activity),
                (Factor::Consistency, consistency),
            ],
            today.caffeine_cups,
        );

        ReadinessScore {
            score,
            zone,
            sleep_factor: sleep,
            energy_factor: energy,
            stress_factor: stress,
            activity_factor: activity,
            consistency_factor: consistency,
            summary: zone.summary().to_string(),
            suggestions,
        }
    }

    pub fn zone_for(&self, score: i32) -> Zone {
        if score < self.config.zone_low_below {
            Zone::Low
        } else if score > self.config.zone_high_above {
            Zone::High
        } else {
            Zone::Moderate
        }
    }

    /// Full marks inside the target band, quadratic falloff outside it.
    pub fn sleep_hours_score(&self, hours: f64) -> f64 {
        let cfg = self.config;
        let distance = if hours < cfg.sleep_target_min {
            cfg.sleep_target_min - hours
        } else if hours > cfg.sleep_target_max {
            hours - cfg.sleep_target_max
        } else {
            0.0
        };
        (1.0 - (distance / cfg.sleep_tolerance_hours).powi(2)).max(0.0)
    }

    pub fn sleep_factor(&self, hours: f64, quality: i32) -> f64 {
        let quality = unit(f64::from(quality) / 10.0);
        unit(SLEEP_HOURS_SHARE * self.sleep_hours_score(hours) + (1.0 - SLEEP_HOURS_SHARE) * quality)
    }

    pub fn energy_factor(energy_level: i32) -> f64 {
        unit(f64::from(energy_level) / 10.0)
    }

    pub fn stress_factor(stress_level: i32) -> f64 {
        unit(1.0 - f64::from(stress_level) / 10.0)
    }

    /// Saturates at the daily targets; no activity still earns the floor.
    pub fn activity_factor(&self, minutes: i32, steps: i32) -> f64 {
        let cfg = self.config;
        let minutes = unit(f64::from(minutes) / cfg.activity_target_minutes);
        let steps = unit(f64::from(steps) / cfg.steps_target);
        let effort = MINUTES_SHARE * minutes + (1.0 - MINUTES_SHARE) * steps;
        unit(cfg.activity_floor + (1.0 - cfg.activity_floor) * effort)
    }

    /// Stability of sleep and stress across the window ending today.
    pub fn consistency_factor(&self, today: &DailyMetrics, history: &[DailyMetrics]) -> f64 {
        let earliest = days_before(today.date, self.config.consistency_window_days);
        let mut series: Vec<&DailyMetrics> = history
            .iter()
            .filter(|d| d.date < today.date && d.date >= earliest)
            .collect();
        if series.is_empty() {
            return self.config.consistency_neutral;
        }

        // Total order so duplicate days resolve the same way for any input order.
        series.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.sleep_hours.total_cmp(&b.sleep_hours))
                .then(a.stress_level.cmp(&b.stress_level))
        });
        series.dedup_by_key(|d| d.date);
        series.push(today);

        let steps = (series.len() - 1) as f64;
        let (sleep_swing, stress_swing) =
            series
                .windows(2)
                .fold((0.0, 0.0), |(sleep, stress), pair| {
                    (
                        sleep + (pair[1].sleep_hours - pair[0].sleep_hours).abs(),
                        stress + f64::from((pair[1].stress_level - pair[0].stress_level).abs()),
                    )
                });

        let sleep_stability = unit(1.0 - (sleep_swing / steps) / SLEEP_SWING_LIMIT);
        let stress_stability = unit(1.0 - (stress_swing / steps) / STRESS_SWING_LIMIT);
        (sleep_stability + stress_stability) / 2.0
    }

    fn suggestions(&self, factors: &[(Factor, f64)], caffeine_cups: i32) -> Vec<String> {
        let mut weak: Vec<(Factor, f64)> = factors
            .iter()
            .copied()
            .filter(|(factor, value)| *value < factor.threshold())
            .collect();
        // Stable sort keeps the fixed factor order for ties.
        weak.sort_by(|a, b| a.1.total_cmp(&b.1));

        let max = self.config.max_suggestions;
        let mut suggestions: Vec<String> = weak
            .into_iter()
            .take(max)
            .map(|(factor, _)| factor.suggestion(self.config))
            .collect();

        if suggestions.len() < max && caffeine_cups >= HEAVY_CAFFEINE_CUPS {
            suggestions.push("cut back on caffeine after midday".into());
        }
        suggestions
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(date: NaiveDate) -> DailyMetrics {
        DailyMetrics {
            date,
            sleep_hours: 8.0,
            sleep_quality: 9,
            energy_level: 8,
            stress_level: 2,
            activity_minutes: 30,
            steps: 6000,
            caffeine_cups: 0,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn test_rested_day_is_high_with_no_suggestions() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let result = scorer.score(&day(today()), &[]);

        assert_eq!(result.zone, Zone::High);
        assert!(result.score >= 70, "score was {}", result.score);
        assert!(result.suggestions.is_empty(), "{:?}", result.suggestions);
        assert_eq!(result.consistency_factor, cfg.consistency_neutral);
    }

    #[test]
    fn test_exhausted_day_is_low_with_sleep_and_stress_first() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let exhausted = DailyMetrics {
            sleep_hours: 4.0,
            sleep_quality: 2,
            energy_level: 2,
            stress_level: 9,
            activity_minutes: 0,
            steps: 0,
            ..day(today())
        };
        let result = scorer.score(&exhausted, &[]);

        assert_eq!(result.zone, Zone::Low);
        assert!(result.score < 40, "score was {}", result.score);
        assert_eq!(result.suggestions.len(), 3);
        assert!(result.suggestions[0].contains("sleep"));
        assert!(result.suggestions[1].contains("stress"));
    }

    #[test]
    fn test_missing_today_is_not_available() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let history = vec![day(days_ago(1)), day(days_ago(2))];
        assert!(scorer.assess(None, &history).is_none());
        assert!(scorer.assess(Some(&day(today())), &history).is_some());
    }

    #[test]
    fn test_score_always_in_range_and_zone_consistent() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        for hours in [0.0, 3.5, 6.0, 8.0, 11.0, 24.0] {
            for level in 1..=10 {
                for minutes in [0, 15, 90, 600] {
                    let metrics = DailyMetrics {
                        sleep_hours: hours,
                        sleep_quality: level,
                        energy_level: level,
                        stress_level: 11 - level,
                        activity_minutes: minutes,
                        steps: minutes * 120,
                        ..day(today())
                    };
                    let result = scorer.score(&metrics, &[day(days_ago(1))]);
                    assert!((0..=100).contains(&result.score));
                    let expected = if result.score < 40 {
                        Zone::Low
                    } else if result.score > 70 {
                        Zone::High
                    } else {
                        Zone::Moderate
                    };
                    assert_eq!(result.zone, expected);
                    assert!(result.suggestions.len() <= cfg.max_suggestions);
                }
            }
        }
    }

    #[test]
    fn test_history_order_does_not_change_result() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let mut history = vec![
            DailyMetrics { sleep_hours: 5.0, stress_level: 7, ..day(days_ago(1)) },
            DailyMetrics { sleep_hours: 9.0, stress_level: 3, ..day(days_ago(2)) },
            DailyMetrics { sleep_hours: 6.5, stress_level: 5, ..day(days_ago(4)) },
        ];
        let forward = scorer.score(&day(today()), &history);
        history.reverse();
        let backward = scorer.score(&day(today()), &history);
        assert_eq!(forward, backward);
        assert_eq!(forward, scorer.score(&day(today()), &history));
    }

    #[test]
    fn test_sleep_factor_monotonic_toward_target_band() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let mut previous = scorer.sleep_factor(0.0, 5);
        let mut hours = 0.0;
        while hours <= cfg.sleep_target_min {
            let current = scorer.sleep_factor(hours, 5);
            assert!(current >= previous, "{hours}h dropped sleep factor");
            previous = current;
            hours += 0.25;
        }
        assert_eq!(scorer.sleep_hours_score(8.0), 1.0);
        assert!(scorer.sleep_hours_score(10.0) < 1.0);
        assert!(scorer.sleep_hours_score(10.0) > scorer.sleep_hours_score(11.0));
    }

    #[test]
    fn test_stress_factor_never_increases_with_stress() {
        let mut previous = ReadinessScorer::stress_factor(1);
        for level in 2..=10 {
            let current = ReadinessScorer::stress_factor(level);
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(ReadinessScorer::stress_factor(10), 0.0);
    }

    #[test]
    fn test_activity_has_floor_and_saturates() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        assert_eq!(scorer.activity_factor(0, 0), cfg.activity_floor);
        assert_eq!(scorer.activity_factor(30, 8000), 1.0);
        assert_eq!(scorer.activity_factor(300, 40_000), 1.0);
        assert!(scorer.activity_factor(15, 2000) < scorer.activity_factor(30, 2000));
    }

    #[test]
    fn test_consistency_rewards_stable_patterns() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let steady: Vec<_> = (1..=5).map(|n| day(days_ago(n))).collect();
        let swinging: Vec<_> = (1..=5)
            .map(|n| DailyMetrics {
                sleep_hours: if n % 2 == 0 { 4.0 } else { 10.0 },
                stress_level: if n % 2 == 0 { 9 } else { 2 },
                ..day(days_ago(n))
            })
            .collect();

        let stable = scorer.consistency_factor(&day(today()), &steady);
        let unstable = scorer.consistency_factor(&day(today()), &swinging);
        assert_eq!(stable, 1.0);
        assert!(unstable < 0.5, "unstable was {unstable}");
    }

    #[test]
    fn test_consistency_ignores_logs_outside_window() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let stale = vec![
            DailyMetrics { sleep_hours: 3.0, stress_level: 10, ..day(days_ago(30)) },
            DailyMetrics { sleep_hours: 3.0, stress_level: 10, ..day(today()) },
            DailyMetrics { sleep_hours: 3.0, stress_level: 10, ..day(today() + Duration::days(1)) },
        ];
        assert_eq!(
            scorer.consistency_factor(&day(today()), &stale),
            cfg.consistency_neutral
        );
    }

    #[test]
    fn test_duplicate_days_resolve_the_same_in_any_order() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let short = DailyMetrics { sleep_hours: 5.0, stress_level: 7, ..day(days_ago(1)) };
        let long = DailyMetrics { sleep_hours: 9.5, stress_level: 2, ..day(days_ago(1)) };
        let earlier = DailyMetrics { sleep_hours: 7.0, stress_level: 4, ..day(days_ago(2)) };

        let one_way = vec![short.clone(), long.clone(), earlier.clone()];
        let other_way = vec![long, earlier.clone(), short.clone()];
        let first = scorer.consistency_factor(&day(today()), &one_way);
        let second = scorer.consistency_factor(&day(today()), &other_way);
        assert_eq!(first, second);

        // The duplicate collapses to a single day rather than adding a swing.
        let deduped = scorer.consistency_factor(&day(today()), &[earlier, short]);
        assert_eq!(first, deduped);
    }

    #[test]
    fn test_oversized_window_does_not_panic() {
        let cfg = ScoringConfig {
            consistency_window_days: i64::MAX,
            ..ScoringConfig::default()
        };
        let scorer = ReadinessScorer::new(&cfg);
        let history = vec![day(days_ago(1)), day(days_ago(400))];
        let result = scorer.score(&day(today()), &history);
        assert_eq!(result.consistency_factor, 1.0);
    }

    #[test]
    fn test_suggestions_capped_and_worst_first() {
        let cfg = ScoringConfig {
            max_suggestions: 2,
            ..ScoringConfig::default()
        };
        let scorer = ReadinessScorer::new(&cfg);
        let worn = DailyMetrics {
            sleep_hours: 6.0,
            sleep_quality: 3,
            energy_level: 1,
            stress_level: 8,
            activity_minutes: 0,
            steps: 0,
            ..day(today())
        };
        let result = scorer.score(&worn, &[]);
        assert_eq!(result.suggestions.len(), 2);
        assert!(result.suggestions[0].contains("highest-energy"));
        assert!(result.suggestions[1].contains("stress"));
    }

    #[test]
    fn test_heavy_caffeine_adds_suggestion_when_room() {
        let cfg = ScoringConfig::default();
        let scorer = ReadinessScorer::new(&cfg);
        let wired = DailyMetrics {
            caffeine_cups: 5,
            ..day(today())
        };
        let result = scorer.score(&wired, &[]);
        assert_eq!(result.suggestions, vec!["cut back on caffeine after midday".to_string()]);
    }

    #[test]
    fn test_custom_weights_change_score() {
        let sleep_heavy = ScoringConfig {
            weight_sleep: 0.6,
            weight_energy: 0.1,
            weight_stress: 0.1,
            weight_activity: 0.1,
            weight_consistency: 0.1,
            ..ScoringConfig::default()
        };
        assert!(sleep_heavy.validate().is_ok());
        let defaults = ScoringConfig::default();
        let short_night = DailyMetrics {
            sleep_hours: 4.5,
            sleep_quality: 3,
            ..day(today())
        };
        let heavy = ReadinessScorer::new(&sleep_heavy).score(&short_night, &[]);
        let normal = ReadinessScorer::new(&defaults).score(&short_night, &[]);
        assert!(heavy.score < normal.score);
    }

    #[test]
    fn test_zone_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Zone::Moderate).unwrap(), "moderate");
    }
}
