//! Run configuration.
//!
//! Settings come from the environment; command-line flags override them.
//! Empty or unset variables keep the default.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `MMC_MAX_STEPS` | step budget per run | unlimited |
//! | `MMC_OUTPUT_WIDTH` | characters per output chunk | 4 |
//! | `MMC_LOG` | `debug`, `info`, `warn` or `error` | `info` |

use crate::machine::errors::MachineError;
use crate::machine::vm::OUTPUT_WIDTH;
use crate::utils::log::{self, Level};
use std::env;

pub const MAX_STEPS_VAR: &str = "MMC_MAX_STEPS";
pub const OUTPUT_WIDTH_VAR: &str = "MMC_OUTPUT_WIDTH";
pub const LOG_VAR: &str = "MMC_LOG";

/// Settings for one execution of the `mmc` runner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
    /// Step budget; `None` runs until the program halts.
    pub max_steps: Option<u64>,
    pub output_width: usize,
    pub log_level: Level,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            output_width: OUTPUT_WIDTH,
            log_level: Level::Info,
        }
    }
}

impl RunConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, MachineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MachineError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(value) = get(MAX_STEPS_VAR) {
            config.max_steps = Some(parse_positive(MAX_STEPS_VAR, &value)?);
        }
        if let Some(value) = get(OUTPUT_WIDTH_VAR) {
            config.output_width = parse_positive(OUTPUT_WIDTH_VAR, &value)?;
        }
        if let Some(value) = get(LOG_VAR) {
            config.log_level = parse_level(LOG_VAR, &value)?;
        }
        Ok(config)
    }

    /// Installs the configured log level process-wide.
    pub fn apply_logging(&self) {
        log::set_max_level(self.log_level);
    }
}

/// Parses a strictly positive integer setting.
pub fn parse_positive<T>(key: &str, value: &str) -> Result<T, MachineError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let invalid = |reason| MachineError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };
    let parsed: T = value
        .parse()
        .map_err(|_| invalid("expected a positive integer"))?;
    if parsed == T::default() {
        return Err(invalid("must be greater than 0"));
    }
    Ok(parsed)
}

/// Parses a log level name.
pub fn parse_level(key: &str, value: &str) -> Result<Level, MachineError> {
    value.parse().map_err(|_| MachineError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected one of debug, info, warn, error",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::errors::ErrorKind;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = RunConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.output_width, 4);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn reads_all_variables() {
        let config = RunConfig::from_lookup(lookup(&[
            (MAX_STEPS_VAR, "5000"),
            (OUTPUT_WIDTH_VAR, " 8 "),
            (LOG_VAR, "debug"),
        ]))
        .unwrap();
        assert_eq!(config.max_steps, Some(5000));
        assert_eq!(config.output_width, 8);
        assert_eq!(config.log_level, Level::Debug);
    }

    #[test]
    fn empty_values_keep_defaults() {
        let config = RunConfig::from_lookup(lookup(&[(MAX_STEPS_VAR, ""), (LOG_VAR, "  ")])).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn rejects_malformed_values() {
        let err = RunConfig::from_lookup(lookup(&[(MAX_STEPS_VAR, "lots")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains(MAX_STEPS_VAR));

        let err = RunConfig::from_lookup(lookup(&[(OUTPUT_WIDTH_VAR, "0")])).unwrap_err();
        assert!(err.to_string().contains("must be greater than 0"));

        assert!(RunConfig::from_lookup(lookup(&[(LOG_VAR, "loud")])).is_err());
    }
}
