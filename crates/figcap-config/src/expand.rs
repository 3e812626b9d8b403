//! Expansion of directory settings read from `figcap.toml`.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand a directory value.
///
/// A leading `~` becomes `$HOME`. `${VAR}` must be set and `${VAR:-default}`
/// falls back to `default`. A bare `$VAR` is kept as written, since batch
/// directory names occasionally contain dollars.
pub(crate) fn expand_dir(value: &str, field: &str) -> Result<String, ConfigError> {
    let value = shellexpand::tilde_with_context(value, || std::env::var("HOME").ok());
    if !value.contains("${") {
        return Ok(value.into_owned());
    }

    shellexpand::env_with_context(&*value, |var| std::env::var(var).map(Some))
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}
