use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::consumer::{DEFAULT_MAX_MESSAGES, DEFAULT_WAIT_TIME, MAX_BATCH};

/// Default path of the line-set file.
pub const DEFAULT_LINES_FILE: &str = "./files/test.csv";

/// Supplier configuration
///
/// Defaults match the original deployment: a 2-minute work window with a
/// 10-second publish interval, receive batches of 5 with a 20-second
/// long-poll.
#[derive(Debug, Clone)]
pub struct SupplierConfig {
    /// Path of the file the line set is loaded from at startup
    pub lines_file: PathBuf,

    /// Name of the control queue carrying operator commands
    pub control_queue: String,

    /// Name of the broadcast topic the feed is published to
    pub topic: String,

    /// Full work window granted by a freshly sent command
    pub full_window: Duration,

    /// Pause between consecutive publishes
    pub sleep_interval: Duration,

    /// Receive batch size per poll
    pub max_messages: usize,

    /// Long-poll wait per receive
    pub wait_time: Duration,
}

impl SupplierConfig {
    pub fn new(control_queue: &str, topic: &str) -> Self {
        Self {
            lines_file: PathBuf::from(DEFAULT_LINES_FILE),
            control_queue: control_queue.to_string(),
            topic: topic.to_string(),
            full_window: Duration::from_secs(120),
            sleep_interval: Duration::from_secs(10),
            max_messages: DEFAULT_MAX_MESSAGES,
            wait_time: DEFAULT_WAIT_TIME,
        }
    }

    /// Set the line-set file path
    pub fn lines_file(mut self, path: impl AsRef<Path>) -> Self {
        self.lines_file = path.as_ref().to_path_buf();
        self
    }

    /// Set the full work window
    pub fn full_window(mut self, window: Duration) -> Self {
        self.full_window = window;
        self
    }

    /// Set the publish interval
    pub fn sleep_interval(mut self, interval: Duration) -> Self {
        self.sleep_interval = interval;
        self
    }

    /// Set the receive batch size
    pub fn max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    /// Set the long-poll wait
    pub fn wait_time(mut self, wait: Duration) -> Self {
        self.wait_time = wait;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.control_queue.is_empty() {
            return Err("control_queue cannot be empty".to_string());
        }

        if self.topic.is_empty() {
            return Err("topic cannot be empty".to_string());
        }

        if self.sleep_interval.is_zero() {
            return Err("sleep_interval must be > 0".to_string());
        }

        if self.wait_time.is_zero() {
            return Err("wait_time must be > 0".to_string());
        }

        if self.max_messages == 0 {
            return Err("max_messages must be > 0".to_string());
        }

        if self.max_messages > MAX_BATCH {
            return Err(format!("max_messages cannot exceed {}", MAX_BATCH));
        }

        Ok(())
    }
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self::new("heatmap-supplier", "heatmap")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SupplierConfig::default();
        assert_eq!(config.control_queue, "heatmap-supplier");
        assert_eq!(config.topic, "heatmap");
        assert_eq!(config.full_window, Duration::from_secs(120));
        assert_eq!(config.sleep_interval, Duration::from_secs(10));
        assert_eq!(config.max_messages, 5);
        assert_eq!(config.wait_time, Duration::from_secs(20));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SupplierConfig::new("ctrl", "events")
            .lines_file("./data/coords.csv")
            .full_window(Duration::from_secs(60))
            .sleep_interval(Duration::from_secs(5))
            .max_messages(10)
            .wait_time(Duration::from_secs(2));

        assert_eq!(config.control_queue, "ctrl");
        assert_eq!(config.topic, "events");
        assert_eq!(config.lines_file, PathBuf::from("./data/coords.csv"));
        assert_eq!(config.full_window, Duration::from_secs(60));
        assert_eq!(config.sleep_interval, Duration::from_secs(5));
        assert_eq!(config.max_messages, 10);
        assert_eq!(config.wait_time, Duration::from_secs(2));
    }

    #[test]
    fn test_validate() {
        assert!(SupplierConfig::default().validate().is_ok());

        let empty_queue = SupplierConfig::new("", "events");
        assert!(empty_queue.validate().is_err());

        let empty_topic = SupplierConfig::new("ctrl", "");
        assert!(empty_topic.validate().is_err());

        let zero_interval = SupplierConfig::new("ctrl", "events").sleep_interval(Duration::ZERO);
        assert!(zero_interval.validate().is_err());

        let zero_wait = SupplierConfig::new("ctrl", "events").wait_time(Duration::ZERO);
        assert!(zero_wait.validate().is_err());

        let zero_batch = SupplierConfig::new("ctrl", "events").max_messages(0);
        assert!(zero_batch.validate().is_err());

        let oversized_batch = SupplierConfig::new("ctrl", "events").max_messages(11);
        assert!(oversized_batch.validate().is_err());
    }
}
