/// Configuration of the allocator logger.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoggerConfig {
    /// What the allocator reports.
    #[serde(default)]
    pub level: AllocLogLevel,

    /// Level of the `log` records emitted for heap events.
    #[serde(default)]
    pub log: LogCrateLevel,
}

/// What the allocator reports.
#[derive(
    Default, Clone, Copy, Debug, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum AllocLogLevel {
    /// Nothing is logged.
    #[serde(rename = "disabled")]
    Disabled,

    /// Heap registration and retirement.
    #[default]
    #[serde(rename = "basic")]
    Basic,

    /// Heap events and every block transition.
    #[serde(rename = "full")]
    Full,
}

/// Log levels using the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[default]
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

impl From<LogCrateLevel> for log::Level {
    fn from(level: LogCrateLevel) -> Self {
        match level {
            LogCrateLevel::Info => log::Level::Info,
            LogCrateLevel::Debug => log::Level::Debug,
            LogCrateLevel::Trace => log::Level::Trace,
        }
    }
}
