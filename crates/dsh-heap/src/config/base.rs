use super::memory::MemoryConfig;
use crate::error::{HeapError, Result};
use alloc::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static DSH_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// Global configuration of the crate.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Block manager settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not set.
    ///
    /// If no configuration is set, it attempts to load one from `dsh-heap.toml` in the current
    /// directory or its parents. If no file is found, a default configuration is used.
    pub fn get() -> Arc<Self> {
        let mut state = DSH_GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                cfg_if::cfg_if! {
                    if #[cfg(std_io)] {
                        let config = Self::from_current_dir().override_from_env();
                    } else {
                        let config = Self::default();
                    }
                }

                let config = Arc::new(config);
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Sets the global configuration to the provided value.
    ///
    /// Must happen before the first call to [get](GlobalConfig::get), the configuration can't be
    /// replaced afterward.
    pub fn set(config: Self) -> Result<()> {
        let mut state = DSH_GLOBAL_CONFIG.lock();
        if state.is_some() {
            return Err(HeapError::invalid(
                "The global configuration is already set",
            ));
        }

        *state = Some(Arc::new(config));
        Ok(())
    }

    /// Parses a configuration from its toml representation.
    #[cfg(std_io)]
    pub fn from_toml(content: &str) -> core::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[cfg(std_io)]
    /// Save the current configuration to the provided file path.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        std::fs::write(path, content)
    }

    #[cfg(std_io)]
    /// Overrides configuration fields based on environment variables.
    pub fn override_from_env(mut self) -> Self {
        use super::logger::{AllocLogLevel, LogCrateLevel};

        if let Ok(val) = std::env::var("DSH_HEAP_LOG") {
            match val.as_str() {
                "0" | "false" | "disabled" => {
                    self.memory.logger.level = AllocLogLevel::Disabled;
                }
                "1" | "true" | "basic" => {
                    self.memory.logger.level = AllocLogLevel::Basic;
                }
                "full" => {
                    self.memory.logger.level = AllocLogLevel::Full;
                }
                "trace" => {
                    self.memory.logger.level = AllocLogLevel::Full;
                    self.memory.logger.log = LogCrateLevel::Trace;
                }
                _ => {}
            }
        }

        if let Ok(val) = std::env::var("DSH_HEAP_REFRESH_THRESHOLD")
            && let Ok(threshold) = val.parse::<u32>()
        {
            self.memory.refresh_threshold = threshold;
        }

        self
    }

    // Loads configuration from `dsh-heap.toml` in the current directory or its parents.
    #[cfg(std_io)]
    fn from_current_dir() -> Self {
        let mut dir = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return Self::default(),
        };

        loop {
            match Self::from_file_path(dir.join("dsh-heap.toml")) {
                Ok(config) => return config,
                Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                    log::warn!("Ignoring malformed {}: {err}", dir.join("dsh-heap.toml").display());
                    return Self::default();
                }
                Err(_) => {}
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    // Loads configuration from a specified file path.
    #[cfg(std_io)]
    fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }
}
