pub mod global;
pub mod model;

pub use global::settings;
pub use model::{
    CompactionConfig, LevelConfig, LoggingConfig, Settings, load_settings, load_settings_from,
};
