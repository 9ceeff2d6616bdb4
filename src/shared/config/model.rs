use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::errors::ConfigError;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub compaction: CompactionConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw)?;
        settings.compaction.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

/// Limits of a single compaction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Number of blocks that completes a batch and a job.
    pub max_blocks: u32,
    /// Age after which an incomplete batch is flushed and an incomplete job is
    /// forced. Also bounds the time span of blocks within one job. 0 disables both.
    #[serde(default)]
    pub max_age_ms: u64,
}

impl LevelConfig {
    pub fn new(max_blocks: u32, max_age: Duration) -> Self {
        Self {
            max_blocks,
            max_age_ms: max_age.as_millis() as u64,
        }
    }

    pub fn max_age_nanos(&self) -> i64 {
        (self.max_age_ms as i64).saturating_mul(1_000_000)
    }

    pub(crate) fn exceeds_max_size(&self, size: u32) -> bool {
        size >= self.max_blocks
    }

    /// `created_at` and `now` are raft log timestamps in nanoseconds.
    pub(crate) fn exceeds_max_age(&self, created_at: i64, now: i64) -> bool {
        let max_age = self.max_age_nanos();
        max_age > 0 && now.saturating_sub(created_at) > max_age
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Per-level limits; blocks of levels past the end are not compacted.
    pub levels: Vec<LevelConfig>,
    /// Tombstones younger than this are not attached to jobs.
    #[serde(default)]
    pub cleanup_delay_ms: u64,
    /// Max number of tombstones attached to a single job.
    #[serde(default)]
    pub cleanup_batch_size: u32,
    #[serde(default)]
    pub cleanup_job_min_level: u32,
    #[serde(default)]
    pub cleanup_job_max_level: u32,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                LevelConfig::new(20, Duration::from_secs(5 * 60)),
                LevelConfig::new(10, Duration::from_secs(30 * 60)),
                LevelConfig::new(10, Duration::from_secs(2 * 3600)),
                LevelConfig::new(10, Duration::from_secs(12 * 3600)),
            ],
            cleanup_delay_ms: 15 * 60 * 1000,
            cleanup_batch_size: 2,
            cleanup_job_min_level: 0,
            cleanup_job_max_level: 1,
        }
    }
}

impl CompactionConfig {
    pub fn with_levels(levels: Vec<LevelConfig>) -> Self {
        Self {
            levels,
            cleanup_delay_ms: 0,
            cleanup_batch_size: 0,
            cleanup_job_min_level: 0,
            cleanup_job_max_level: 0,
        }
    }

    pub fn level(&self, level: u32) -> Option<&LevelConfig> {
        self.levels.get(level as usize)
    }

    pub fn cleanup_delay_nanos(&self) -> i64 {
        (self.cleanup_delay_ms as i64).saturating_mul(1_000_000)
    }

    pub(crate) fn cleanup_applies_to(&self, level: u32) -> bool {
        level >= self.cleanup_job_min_level && level <= self.cleanup_job_max_level
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one compaction level is required".into(),
            ));
        }
        if let Some(level) = self.levels.iter().position(|l| l.max_blocks == 0) {
            return Err(ConfigError::Invalid(format!(
                "level {level}: max_blocks must be greater than zero"
            )));
        }
        if self.cleanup_job_min_level > self.cleanup_job_max_level {
            return Err(ConfigError::Invalid(format!(
                "cleanup_job_min_level ({}) exceeds cleanup_job_max_level ({})",
                self.cleanup_job_min_level, self.cleanup_job_max_level
            )));
        }
        Ok(())
    }
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    let config_path =
        env::var("METASTORE_COMPACTOR_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

pub fn load_settings_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref().to_string_lossy().into_owned();
    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&path))
        .build()?
        .try_deserialize()?;

    settings.compaction.validate()?;
    Ok(settings)
}
