//! Configuration management.

use serde::Deserialize;
use std::time::Duration;

/// Main configuration for moodmate.
#[derive(Debug, Clone)]
pub struct MoodmateConfig {
    /// Line-count threshold above which a function is considered too long.
    pub long_function_threshold: usize,
    /// Content feed settings.
    pub feed: FeedConfig,
    /// Timing constants for debounce, cooldown, and transient reverts.
    pub timings: Timings,
}

/// Content feed settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed endpoint URL.
    pub endpoint: String,
    /// Number of items requested per batch.
    pub batch_size: usize,
    /// Items served before the session locks.
    pub quota: u32,
    /// How long a lock lasts once the quota is reached.
    pub lock_duration: Duration,
}

/// Timing constants for the aggregation core.
///
/// Defaults match the observed product behavior; tests shrink them freely.
#[derive(Debug, Clone)]
pub struct Timings {
    /// Quiet interval after a text change before the sentinel scans.
    pub sentinel_debounce: Duration,
    /// Minimum interval between two long-function complaints.
    pub complaint_cooldown: Duration,
    /// How long a chat bubble stays visible.
    pub bubble_duration: Duration,
    /// How long the celebratory state lingers after a commit.
    pub success_revert: Duration,
    /// How long the long-function warning state lingers.
    pub warning_revert: Duration,
}

impl Default for MoodmateConfig {
    fn default() -> Self {
        Self {
            long_function_threshold: 10,
            feed: FeedConfig::default(),
            timings: Timings::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://memesapi.vercel.app/give".to_string(),
            batch_size: 40,
            quota: 10,
            lock_duration: Duration::from_secs(25 * 60),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            sentinel_debounce: Duration::from_millis(2000),
            complaint_cooldown: Duration::from_millis(3000),
            bubble_duration: Duration::from_millis(5000),
            success_revert: Duration::from_millis(5000),
            warning_revert: Duration::from_millis(3000),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Long-function line threshold.
    pub long_function_threshold: Option<usize>,
    /// Feed section.
    pub feed: Option<ConfigFileFeed>,
}

/// Feed section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFeed {
    /// Feed endpoint URL.
    pub endpoint: Option<String>,
    /// Items per fetched batch.
    pub batch_size: Option<usize>,
    /// Items served before locking.
    pub quota: Option<u32>,
    /// Lock duration in seconds.
    pub lock_duration_secs: Option<u64>,
}

impl MoodmateConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/moodmate/` on macOS)
    /// 2. XDG config dir (`~/.config/moodmate/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        // Check platform-specific config dir first
        let platform_config = base_dirs.config_dir().join("moodmate").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        // Fall back to XDG-style ~/.config/moodmate/ for Unix compatibility
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("moodmate")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `MoodmateConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(threshold) = file.long_function_threshold {
            config.long_function_threshold = threshold;
        }
        if let Some(feed) = file.feed {
            if let Some(endpoint) = feed.endpoint {
                config.feed.endpoint = endpoint;
            }
            if let Some(batch_size) = feed.batch_size {
                config.feed.batch_size = batch_size;
            }
            if let Some(quota) = feed.quota {
                config.feed.quota = quota;
            }
            if let Some(secs) = feed.lock_duration_secs {
                config.feed.lock_duration = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Sets the long-function threshold.
    #[must_use]
    pub const fn with_long_function_threshold(mut self, threshold: usize) -> Self {
        self.long_function_threshold = threshold;
        self
    }

    /// Sets the feed configuration.
    #[must_use]
    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    /// Sets the timing constants.
    #[must_use]
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }
}
