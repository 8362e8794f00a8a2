use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

/// Longest trailing window the consistency factor may look back over.
pub const MAX_CONSISTENCY_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the in-memory store is used.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,

    pub write_rate_limit_max: u32,
    pub write_rate_limit_window_secs: u64,

    pub scoring: ScoringConfig,
}

/// Tunable constants for readiness scoring and the sleep analytics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weight_sleep: f64,
    pub weight_energy: f64,
    pub weight_stress: f64,
    pub weight_activity: f64,
    pub weight_consistency: f64,

    pub sleep_target_min: f64,
    pub sleep_target_max: f64,
    /// Hours outside the target band at which the hours score reaches zero.
    pub sleep_tolerance_hours: f64,

    pub activity_target_minutes: f64,
    pub steps_target: f64,
    pub activity_floor: f64,

    pub consistency_window_days: i64,
    pub consistency_neutral: f64,

    pub zone_low_below: i32,
    pub zone_high_above: i32,

    pub max_suggestions: usize,
    pub optimal_sleep_hours: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_sleep: 0.30,
            weight_energy: 0.20,
            weight_stress: 0.20,
            weight_activity: 0.15,
            weight_consistency: 0.15,
            sleep_target_min: 7.0,
            sleep_target_max: 9.0,
            sleep_tolerance_hours: 3.0,
            activity_target_minutes: 30.0,
            steps_target: 8000.0,
            activity_floor: 0.2,
            consistency_window_days: 7,
            consistency_neutral: 0.5,
            zone_low_below: 40,
            zone_high_above: 70,
            max_suggestions: 3,
            optimal_sleep_hours: 8.0,
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        let cfg = Self {
            weight_sleep: env_or("READINESS_WEIGHT_SLEEP", d.weight_sleep)?,
            weight_energy: env_or("READINESS_WEIGHT_ENERGY", d.weight_energy)?,
            weight_stress: env_or("READINESS_WEIGHT_STRESS", d.weight_stress)?,
            weight_activity: env_or("READINESS_WEIGHT_ACTIVITY", d.weight_activity)?,
            weight_consistency: env_or("READINESS_WEIGHT_CONSISTENCY", d.weight_consistency)?,
            sleep_target_min: env_or("READINESS_SLEEP_TARGET_MIN", d.sleep_target_min)?,
            sleep_target_max: env_or("READINESS_SLEEP_TARGET_MAX", d.sleep_target_max)?,
            consistency_window_days: env_or(
                "READINESS_CONSISTENCY_WINDOW_DAYS",
                d.consistency_window_days,
            )?,
            max_suggestions: env_or("READINESS_MAX_SUGGESTIONS", d.max_suggestions)?,
            optimal_sleep_hours: env_or("OPTIMAL_SLEEP_HOURS", d.optimal_sleep_hours)?,
            ..d
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn weights(&self) -> [f64; 5] {
        [
            self.weight_sleep,
            self.weight_energy,
            self.weight_stress,
            self.weight_activity,
            self.weight_consistency,
        ]
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = self.weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("readiness weights must be finite and non-negative");
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            bail!("readiness weights must sum to 1.0, got {sum:.4}");
        }
        if !(positive(self.sleep_target_min)
            && positive(self.sleep_target_max)
            && self.sleep_target_min <= self.sleep_target_max)
        {
            bail!(
                "sleep target band is invalid: {}..{}",
                self.sleep_target_min,
                self.sleep_target_max
            );
        }
        if !positive(self.sleep_tolerance_hours) {
            bail!("sleep tolerance must be a positive number of hours");
        }
        if !(1..=MAX_CONSISTENCY_WINDOW_DAYS).contains(&self.consistency_window_days) {
            bail!(
                "consistency window must be between 1 and {MAX_CONSISTENCY_WINDOW_DAYS} days, got {}",
                self.consistency_window_days
            );
        }
        if self.zone_low_below > self.zone_high_above {
            bail!("zone thresholds overlap");
        }
        if !positive(self.optimal_sleep_hours) {
            bail!("optimal sleep hours must be a positive number");
        }
        Ok(())
    }

    /// The same scoring with the sleep band re-centred on a personal target.
    pub fn with_sleep_target(&self, optimal_hours: f64) -> Self {
        let half_band = (self.sleep_target_max - self.sleep_target_min) / 2.0;
        Self {
            sleep_target_min: optimal_hours - half_band,
            sleep_target_max: optimal_hours + half_band,
            optimal_sleep_hours: optimal_hours,
            ..self.clone()
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty()),

            write_rate_limit_max: env_or("WRITE_RATE_LIMIT_MAX", 30)?,
            write_rate_limit_window_secs: env_or("WRITE_RATE_LIMIT_WINDOW_SECS", 60)?,

            scoring: ScoringConfig::from_env()?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
