//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::wizard::NumericPolicy;

/// Runtime configuration for the wizard binary.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Pause before showing the next prompt in the terminal. Cosmetic only.
    pub prompt_delay: Duration,
    /// How unparseable numeric answers are handled.
    pub numeric_policy: NumericPolicy,
    /// Serve the REST surface on this port instead of running the terminal
    /// REPL.
    pub http_port: Option<u16>,
    /// Directory for a daily-rolling log file, in addition to stderr.
    pub log_dir: Option<PathBuf>,
    /// Key the terminal session is saved under between runs.
    pub session_id: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/event-wizard.db"),
            prompt_delay: Duration::from_millis(400),
            numeric_policy: NumericPolicy::FallbackToZero,
            http_port: None,
            log_dir: None,
            session_id: "cli".to_string(),
        }
    }
}

impl WizardConfig {
    /// Read configuration from `EVENT_WIZARD_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("EVENT_WIZARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let prompt_delay = match lookup("EVENT_WIZARD_PROMPT_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_value("EVENT_WIZARD_PROMPT_DELAY_MS", &raw)?),
            None => defaults.prompt_delay,
        };

        let numeric_policy = match lookup("EVENT_WIZARD_STRICT_NUMBERS").as_deref() {
            Some("1" | "true" | "yes") => NumericPolicy::Reject,
            Some("0" | "false" | "no") | None => NumericPolicy::FallbackToZero,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "EVENT_WIZARD_STRICT_NUMBERS".to_string(),
                    message: format!("expected true or false, got \"{other}\""),
                });
            }
        };

        let http_port = lookup("EVENT_WIZARD_HTTP_PORT")
            .map(|raw| parse_value("EVENT_WIZARD_HTTP_PORT", &raw))
            .transpose()?;

        let log_dir = lookup("EVENT_WIZARD_LOG_DIR").map(PathBuf::from);

        let session_id = lookup("EVENT_WIZARD_SESSION_ID")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.session_id);

        Ok(Self {
            db_path,
            prompt_delay,
            numeric_policy,
            http_port,
            log_dir,
            session_id,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("\"{raw}\": {e}"),
    })
}
