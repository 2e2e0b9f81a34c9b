//! Logging utilities and configuration.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to applications, which can use [`setup::init_logging`] for a ready-made
//! one.

use tracing::Level;

/// Runtime switches for the chattier log statements.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for tic-guard components
    pub base_level: Level,
    /// Whether to log each row-level decision (picks, skipped rows)
    pub log_row_details: bool,
    /// Whether to log data source operations
    pub log_data_operations: bool,
    /// Maximum length for logged field values
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_row_details: false,
            log_data_operations: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Everything, with long values kept.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_row_details: true,
            log_data_operations: true,
            max_field_length: 1024,
        }
    }

    /// Warnings only.
    pub fn quiet() -> Self {
        Self {
            base_level: Level::WARN,
            log_row_details: false,
            log_data_operations: false,
            max_field_length: 128,
        }
    }

    /// True when `base_level` is `DEBUG` or more verbose.
    pub fn detail_enabled(&self) -> bool {
        self.base_level >= Level::DEBUG
    }
}

/// Logs at debug level only when the base level admits it.
#[macro_export]
macro_rules! log_detail {
    ($config:expr, $($arg:tt)*) => {
        if $config.detail_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs at debug level only when row details are enabled.
#[macro_export]
macro_rules! log_row {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_row_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs at info level only when data operations are enabled.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber installation for binaries and tests.
pub mod setup {
    use tracing::Level;

    /// Configuration for the `tracing-subscriber` stack.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything else
        pub level: Level,
        /// Log level for tic-guard and the extra targets
        pub library_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Additional crates that get `library_level`
        pub targets: Vec<String>,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                library_level: Level::INFO,
                json_format: false,
                targets: Vec::new(),
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                library_level: Level::DEBUG,
                ..Self::default()
            }
        }

        pub fn structured() -> Self {
            Self {
                json_format: true,
                ..Self::default()
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_library_level(mut self, level: Level) -> Self {
            self.library_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Gives another crate the library level.
        pub fn with_target(mut self, target: impl Into<String>) -> Self {
            self.targets.push(target.into());
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                return filter.clone();
            }
            let library = self.library_level.as_str().to_lowercase();
            let mut directives = vec![
                self.level.as_str().to_lowercase(),
                format!("tic_guard={library}"),
            ];
            directives.extend(self.targets.iter().map(|t| format!("{t}={library}")));
            directives.join(",")
        }
    }

    /// Installs a global subscriber. `RUST_LOG` takes precedence over the
    /// configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use tic_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// let config = LoggingConfig::development().with_target("fantop");
    /// init_logging(config).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
