pub use rota_core::config::*;
use rota_service::recurrence::RepeatDefaults;

use crate::error::AppResult;

/// ## Summary
/// Resolves the scheduling section into the defaults used when repeat is
/// first enabled.
///
/// ## Errors
/// Returns an error if the configured timezone or repeat span is invalid.
pub fn repeat_defaults(settings: &Settings) -> AppResult<RepeatDefaults> {
    Ok(RepeatDefaults::from_config(&settings.scheduling)?)
}
