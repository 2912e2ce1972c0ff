//! Build context providing logging, stage timing and progress tracking
//!
//! Every entry recorded here is also forwarded to the `log` facade, so hosts
//! that install a logger see the same messages without polling the context.

use std::collections::HashMap;
use std::time::Duration;
use web_time::Instant;

/// Log level for context messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug level messages
    Debug = 0,
    /// Informational messages
    Info = 1,
    /// Warning messages
    Warning = 2,
    /// Error messages
    Error = 3,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Timer categories for the build stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerCategory {
    /// Whole tile build
    Total,
    /// Walkability classification and rasterization
    Rasterization,
    /// Heightfield span filtering
    Filtering,
    /// Compact heightfield building
    CompactHeightfield,
    /// Walkable area erosion
    Erosion,
    /// Distance field and region building
    Regions,
    /// Contour extraction
    Contours,
    /// Polygon mesh generation
    PolyMesh,
    /// Detail mesh generation
    DetailMesh,
    /// Tile data serialization
    TileData,
}

/// Progress information for the running build
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Current step number
    pub current: usize,
    /// Total number of steps
    pub total: usize,
    /// Description of current operation
    pub description: String,
}

/// Log entry containing message and metadata
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Timestamp when log was created
    pub timestamp: Instant,
    /// Log message
    pub message: String,
    /// Optional category for grouping logs
    pub category: Option<String>,
}

/// Accumulated timing for one category
#[derive(Debug, Clone)]
pub struct TimerEntry {
    /// Total duration over all runs
    pub duration: Duration,
    /// Number of times this timer was stopped
    pub count: usize,
}

/// Context for a tile build providing logging, profiling, and progress tracking
#[derive(Debug)]
pub struct BuildContext {
    logs: Vec<LogEntry>,
    active_timers: HashMap<TimerCategory, Instant>,
    timers: HashMap<TimerCategory, TimerEntry>,
    progress: Option<ProgressInfo>,
    min_log_level: LogLevel,
    enable_timing: bool,
    max_log_entries: usize,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext {
    /// Creates a new build context with default settings
    pub fn new() -> Self {
        Self {
            logs: Vec::new(),
            active_timers: HashMap::new(),
            timers: HashMap::new(),
            progress: None,
            min_log_level: LogLevel::Info,
            enable_timing: true,
            max_log_entries: 1000,
        }
    }

    /// Sets the minimum log level
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.min_log_level = level;
    }

    /// Enables or disables performance timing
    pub fn set_timing_enabled(&mut self, enabled: bool) {
        self.enable_timing = enabled;
    }

    /// Sets the maximum number of log entries to keep
    pub fn set_max_log_entries(&mut self, max_entries: usize) {
        self.max_log_entries = max_entries;
    }

    /// Logs a debug message
    pub fn log_debug(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None);
    }

    /// Logs an info message
    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None);
    }

    /// Logs a warning message
    pub fn log_warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message, None);
    }

    /// Logs an error message with category
    pub fn log_error_with_category(
        &mut self,
        message: impl Into<String>,
        category: impl Into<String>,
    ) {
        self.log(LogLevel::Error, message, Some(category.into()));
    }

    /// Logs a message at `level` under `category`
    pub fn log_with_category(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        category: impl Into<String>,
    ) {
        self.log(level, message, Some(category.into()));
    }

    fn log(&mut self, level: LogLevel, message: impl Into<String>, category: Option<String>) {
        if level < self.min_log_level {
            return;
        }

        let message = message.into();
        let log_level: log::Level = level.into();
        match &category {
            Some(category) => log::log!(log_level, "[{}] {}", category, message),
            None => log::log!(log_level, "{}", message),
        }

        self.logs.push(LogEntry {
            level,
            timestamp: Instant::now(),
            message,
            category,
        });

        if self.logs.len() > self.max_log_entries {
            self.logs.remove(0);
        }
    }

    /// Starts a timer for the given category
    pub fn start_timer(&mut self, category: TimerCategory) {
        if self.enable_timing {
            self.active_timers.insert(category, Instant::now());
        }
    }

    /// Stops a timer and records the duration
    pub fn stop_timer(&mut self, category: TimerCategory) {
        if let Some(start_time) = self.active_timers.remove(&category) {
            let entry = self.timers.entry(category).or_insert(TimerEntry {
                duration: Duration::ZERO,
                count: 0,
            });
            entry.duration += start_time.elapsed();
            entry.count += 1;
        }
    }

    /// Gets the total duration for a completed timer
    pub fn get_timer_duration(&self, category: TimerCategory) -> Option<Duration> {
        self.timers.get(&category).map(|entry| entry.duration)
    }

    /// Gets the count for a timer (how many times it was used)
    pub fn get_timer_count(&self, category: TimerCategory) -> usize {
        self.timers
            .get(&category)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Updates progress information
    pub fn set_progress(&mut self, current: usize, total: usize, description: impl Into<String>) {
        self.progress = Some(ProgressInfo {
            current,
            total,
            description: description.into(),
        });
    }

    /// Gets current progress information
    pub fn get_progress(&self) -> Option<&ProgressInfo> {
        self.progress.as_ref()
    }

    /// Gets all log entries
    pub fn get_logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Gets log entries for a specific level
    pub fn get_logs_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.logs
            .iter()
            .filter(|entry| entry.level == level)
            .collect()
    }

    /// Gets log entries for a specific category
    pub fn get_logs_by_category(&self, category: &str) -> Vec<&LogEntry> {
        self.logs
            .iter()
            .filter(|entry| entry.category.as_deref() == Some(category))
            .collect()
    }

    /// Resets the context (clears logs, timers, and progress)
    pub fn reset(&mut self) {
        self.logs.clear();
        self.active_timers.clear();
        self.timers.clear();
        self.progress = None;
    }
}
