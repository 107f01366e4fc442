use super::models::{Config, StoreBackend};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Store backend is fjall but store.path is empty")]
    MissingStorePath,

    #[error("telemetry.log_filter must not be empty")]
    EmptyLogFilter,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(config)?;
    validate_telemetry(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<(), ValidationError> {
    if config.store.backend == StoreBackend::Fjall && config.store.path.as_os_str().is_empty() {
        return Err(ValidationError::MissingStorePath);
    }
    Ok(())
}

fn validate_telemetry(config: &Config) -> Result<(), ValidationError> {
    if config.telemetry.log_filter.trim().is_empty() {
        return Err(ValidationError::EmptyLogFilter);
    }
    Ok(())
}
