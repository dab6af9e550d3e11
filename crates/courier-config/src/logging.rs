// ============================================================================
// Logging Configuration
// ============================================================================

use std::str::FromStr;

/// Output format of the tracing fmt layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!(
                "Invalid LOG_FORMAT '{}': expected 'text' or 'json'",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string, e.g. "info,courier_server=debug"
    pub rust_log: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let format = match std::env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::Text,
        };

        Ok(Self {
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            format,
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}
