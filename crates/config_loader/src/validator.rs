//! Configuration validation
//!
//! Rules:
//! - channel capacities >= 1
//! - simulation ranges (devices 1..=32, rate > 0)
//! - logging level is a known level name

use contracts::{AppConfig, ContractError};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate an AppConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    config.validate().map_err(|e| first_error("", &e))?;
    validate_log_level(config)?;
    Ok(())
}

/// Only bare level names are checked; full filter directives are passed
/// through to the subscriber.
fn validate_log_level(config: &AppConfig) -> Result<(), ContractError> {
    let level = config.logging.level.trim();
    if level.is_empty() {
        return Err(ContractError::config_validation(
            "logging.level",
            "must not be empty",
        ));
    }
    let is_directive = level.contains('=') || level.contains(',');
    if !is_directive && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(ContractError::config_validation(
            "logging.level",
            format!("unknown level '{level}'"),
        ));
    }
    Ok(())
}

/// Flatten validator's nested errors into a dotted field path
fn first_error(prefix: &str, errors: &ValidationErrors) -> ContractError {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| name.to_string());

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let message = list
                    .first()
                    .map(|e| match &e.message {
                        Some(m) => m.to_string(),
                        None => format!("failed '{}' check", e.code),
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                return ContractError::config_validation(path, message);
            }
            ValidationErrorsKind::Struct(nested) => return first_error(&path, nested),
            ValidationErrorsKind::List(items) => {
                if let Some((index, nested)) = items.iter().next() {
                    return first_error(&format!("{path}[{index}]"), nested);
                }
            }
        }
    }
    ContractError::config_validation(prefix, "invalid configuration")
}
