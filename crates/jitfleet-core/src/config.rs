//! fleet.toml configuration parser and the resolved scaling [`Policy`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Pending requests older than this are treated as lost.
pub const DEFAULT_PENDING_EXPIRY: Duration = Duration::from_secs(10 * 60);
/// Nodes are billed per started hour.
pub const DEFAULT_BILLING_PERIOD: Duration = Duration::from_secs(60 * 60);
/// Idle nodes are stopped once this far into a billing period.
pub const DEFAULT_STOP_BEFORE_BOUNDARY: Duration = Duration::from_secs(58 * 60);
/// Nodes older than this are retired even when busy.
pub const DEFAULT_MAX_NODE_AGE: Duration = Duration::from_secs(5 * 60 * 60);
/// Default cadence of the tick driver.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    pub policy: Option<PolicyConfig>,
    pub executor: Option<ExecutorConfig>,
    pub driver: Option<DriverConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub pending_expiry: Option<String>,
    pub billing_period: Option<String>,
    pub stop_before_boundary: Option<String>,
    pub max_node_age: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub stop_strategy: Option<StopStrategy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    pub interval: Option<String>,
}

/// How a multi-node stop is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStrategy {
    /// One request at a time. A failure keeps the entries already
    /// recorded and skips the rest.
    #[default]
    Sequential,
    /// All requests at once. Any failure discards the whole batch.
    Parallel,
}

/// Thresholds used by the reconciler and the decision engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub pending_expiry: Duration,
    pub billing_period: Duration,
    pub stop_before_boundary: Duration,
    pub max_node_age: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            pending_expiry: DEFAULT_PENDING_EXPIRY,
            billing_period: DEFAULT_BILLING_PERIOD,
            stop_before_boundary: DEFAULT_STOP_BEFORE_BOUNDARY,
            max_node_age: DEFAULT_MAX_NODE_AGE,
        }
    }
}

impl Policy {
    /// Check that the thresholds describe a usable billing model.
    pub fn validate(&self) -> ConfigResult<()> {
        for (key, value) in [
            ("pending_expiry", self.pending_expiry),
            ("billing_period", self.billing_period),
            ("stop_before_boundary", self.stop_before_boundary),
            ("max_node_age", self.max_node_age),
        ] {
            if value.is_zero() || value.as_secs() % 60 != 0 || value.subsec_nanos() != 0 {
                return Err(ConfigError::InvalidPolicy(format!(
                    "{key} must be a positive whole number of minutes"
                )));
            }
        }
        if self.stop_before_boundary >= self.billing_period {
            return Err(ConfigError::InvalidPolicy(
                "stop_before_boundary must be shorter than billing_period".to_string(),
            ));
        }
        Ok(())
    }

    pub fn billing_period_mins(&self) -> u64 {
        self.billing_period.as_secs() / 60
    }

    pub fn stop_before_boundary_mins(&self) -> u64 {
        self.stop_before_boundary.as_secs() / 60
    }

    pub fn max_node_age_mins(&self) -> u64 {
        self.max_node_age.as_secs() / 60
    }
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    /// Parse and validate a fleet.toml document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: FleetConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.policy()?;
        config.tick_interval()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve the policy section, filling unset keys with defaults.
    pub fn policy(&self) -> ConfigResult<Policy> {
        let defaults = Policy::default();
        let section = self.policy.clone().unwrap_or_default();

        let policy = Policy {
            pending_expiry: resolve(
                "pending_expiry",
                section.pending_expiry.as_deref(),
                defaults.pending_expiry,
            )?,
            billing_period: resolve(
                "billing_period",
                section.billing_period.as_deref(),
                defaults.billing_period,
            )?,
            stop_before_boundary: resolve(
                "stop_before_boundary",
                section.stop_before_boundary.as_deref(),
                defaults.stop_before_boundary,
            )?,
            max_node_age: resolve(
                "max_node_age",
                section.max_node_age.as_deref(),
                defaults.max_node_age,
            )?,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn stop_strategy(&self) -> StopStrategy {
        self.executor
            .as_ref()
            .and_then(|e| e.stop_strategy)
            .unwrap_or_default()
    }

    pub fn tick_interval(&self) -> ConfigResult<Duration> {
        let raw = self.driver.as_ref().and_then(|d| d.interval.as_deref());
        let interval = resolve("interval", raw, DEFAULT_TICK_INTERVAL)?;
        if interval.is_zero() {
            return Err(ConfigError::InvalidDuration {
                key: "interval",
                value: raw.unwrap_or_default().to_string(),
            });
        }
        Ok(interval)
    }
}

fn resolve(key: &'static str, raw: Option<&str>, default: Duration) -> ConfigResult<Duration> {
    match raw {
        Some(value) => parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
            key,
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a duration string like "30s", "10m", "5h". A bare integer is
/// read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&s[..idx], c),
        _ => (s, 's'),
    };
    let value: u64 = digits.trim().parse().ok()?;
    let secs = match unit {
        's' => value,
        'm' => value.checked_mul(60)?,
        'h' => value.checked_mul(60 * 60)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}
