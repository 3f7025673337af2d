use edge_hub_error::{HubError, HubResult};
use edge_hub_models::settings::Log;
use std::{
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{subscriber::set_global_default, Level};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::DynFilterFn,
    fmt::{self},
    layer::SubscriberExt,
    Layer, Registry,
};

/// Parse a configured level name (`trace`, `debug`, `info`, `warn`, `error`).
pub fn parse_level(level: &str) -> HubResult<Level> {
    Level::from_str(level.trim())
        .map_err(|_| HubError::ConfigurationError(format!("invalid log level: {}", level)))
}

/// Console plus daily-rolling file logger whose level can be changed at runtime.
pub struct Logger {
    level: Arc<Mutex<Level>>,
    directory: String,
    file_name: String,
    _file_guard: Option<WorkerGuard>,
}

impl Logger {
    pub fn new(level: Option<Level>) -> Self {
        let defaults = Log::default();
        Logger {
            level: Arc::new(Mutex::new(level.unwrap_or(Level::INFO))),
            directory: defaults.directory,
            file_name: defaults.file_name,
            _file_guard: None,
        }
    }

    /// Build a logger from the `log` settings section.
    pub fn from_settings(log: &Log) -> HubResult<Self> {
        Ok(Logger {
            level: Arc::new(Mutex::new(parse_level(&log.level)?)),
            directory: log.directory.clone(),
            file_name: log.file_name.clone(),
            _file_guard: None,
        })
    }

    #[inline]
    pub fn set_level(&self, new_level: Level) {
        let mut level = self.level.lock().unwrap_or_else(PoisonError::into_inner);
        *level = new_level;
    }

    #[inline]
    pub fn get_level(&self) -> Level {
        *self.level.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the console and file layers as the global subscriber.
    ///
    /// Fails if a global subscriber is already set.
    pub fn initialize(&mut self) -> HubResult<()> {
        let file_appender = rolling::daily(&self.directory, &self.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        self._file_guard = Some(guard);

        let console_filter = {
            let level = Arc::clone(&self.level);
            DynFilterFn::new(move |metadata, _| {
                metadata.level() <= &*level.lock().unwrap_or_else(PoisonError::into_inner)
            })
        };

        let file_filter = {
            let level = Arc::clone(&self.level);
            DynFilterFn::new(move |metadata, _| {
                metadata.level() <= &*level.lock().unwrap_or_else(PoisonError::into_inner)
            })
        };

        let console_layer = {
            #[cfg(debug_assertions)]
            let layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stdout)
                .with_file(true)
                .with_line_number(true);

            #[cfg(not(debug_assertions))]
            let layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_file(false)
                .with_line_number(false);

            layer.with_filter(console_filter)
        };

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_filter(file_filter);

        let subscriber = Registry::default().with(console_layer).with(file_layer);

        set_global_default(subscriber)
            .map_err(|e| HubError::from(format!("Failed to set logger: {}", e)))?;
        Ok(())
    }
}
