use std::time::Duration;

use crate::shared::config::{CompactionConfig, LevelConfig};

pub struct CompactionConfigFactory {
    config: CompactionConfig,
}

impl CompactionConfigFactory {
    /// Three levels of 3, 2 and 2 blocks, no age limit and no tombstone
    /// cleanup.
    pub fn new() -> Self {
        Self::with_levels(&[3, 2, 2])
    }

    pub fn with_levels(max_blocks: &[u32]) -> Self {
        Self {
            config: CompactionConfig::with_levels(
                max_blocks
                    .iter()
                    .map(|&n| LevelConfig::new(n, Duration::ZERO))
                    .collect(),
            ),
        }
    }

    pub fn with_timed_levels(levels: &[(u32, Duration)]) -> Self {
        Self {
            config: CompactionConfig::with_levels(
                levels
                    .iter()
                    .map(|&(n, age)| LevelConfig::new(n, age))
                    .collect(),
            ),
        }
    }

    pub fn cleanup(mut self, batch_size: u32, min_level: u32, max_level: u32) -> Self {
        self.config.cleanup_batch_size = batch_size;
        self.config.cleanup_job_min_level = min_level;
        self.config.cleanup_job_max_level = max_level;
        self
    }

    pub fn cleanup_delay(mut self, delay: Duration) -> Self {
        self.config.cleanup_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn create(self) -> CompactionConfig {
        self.config
    }
}
