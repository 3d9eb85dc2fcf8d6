// src/config/validate.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DriverError, Result};

static INPUT_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*=").expect("valid input regex"));

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DriverError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.session,
            raw.service,
            raw.store,
            raw.log,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_non_empty("[session].scope_id", &cfg.session.scope_id)?;
    ensure_non_empty("[service].name", &cfg.service.name)?;
    ensure_non_empty("[service].model_name", &cfg.service.model_name)?;
    ensure_non_empty(
        "[service].module_path",
        &cfg.service.module_path.to_string_lossy(),
    )?;
    ensure_non_empty("[service].binary_name", &cfg.service.binary_name)?;
    validate_inputs(cfg)?;
    Ok(())
}

fn ensure_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DriverError::ConfigError(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_inputs(cfg: &RawConfigFile) -> Result<()> {
    for input in cfg.service.input_vars() {
        if !INPUT_VAR.is_match(&input) {
            return Err(DriverError::ConfigError(format!(
                "[service].inputs entry '{input}' is not of the form key=value"
            )));
        }
    }
    Ok(())
}
