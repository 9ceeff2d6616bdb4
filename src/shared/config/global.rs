use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::engine::errors::ConfigError;
use crate::shared::config::model::{Settings, load_settings};

static SETTINGS: OnceCell<Arc<Settings>> = OnceCell::new();

/// Process-wide settings, loaded on first use from the file named by
/// `METASTORE_COMPACTOR_CONFIG` (default `config`). A failed load is not
/// cached; the next call retries it.
pub fn settings() -> Result<Arc<Settings>, ConfigError> {
    SETTINGS
        .get_or_try_init(|| load_settings().map(Arc::new))
        .cloned()
}
