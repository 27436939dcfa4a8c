//! Compile-time checks on item values.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::Action;
use crate::infra::config::Validation;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z][A-Za-z0-9+.\-]*://(www\.)?[-A-Za-z0-9@:%._+~#=]{1,256}\.[A-Za-z]{2,63}\b[-A-Za-z0-9()@:%_+.~#?&/=;,!*'$\[\]]*$",
    )
    .expect("url pattern compiles")
});

/// Value rules for each action kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRules {
    app_extension: String,
}

impl Default for ValueRules {
    fn default() -> Self {
        Self::from_config(&Validation::default())
    }
}

impl ValueRules {
    pub fn from_config(validation: &Validation) -> Self {
        Self::with_app_extension(&validation.app_extension())
    }

    pub fn with_app_extension(extension: &str) -> Self {
        Self {
            app_extension: extension.trim_start_matches('.').to_owned(),
        }
    }

    /// Check `value` against the rule for `action`, returning the failure message.
    pub fn check(&self, action: Action, value: &str) -> Result<(), String> {
        match action {
            Action::App if !self.is_executable(value) => {
                Err(format!("No .{} at path.", self.app_extension))
            }
            Action::File if !is_file(value) => Err("No file at path.".into()),
            Action::Url if !is_url(value) => Err("Invalid URL.".into()),
            Action::Shell if value.trim().is_empty() => Err("Empty command.".into()),
            _ => Ok(()),
        }
    }

    /// An existing path carrying the configured executable extension.
    pub fn is_executable(&self, value: &str) -> bool {
        let path = Path::new(value);
        let has_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.app_extension));
        has_extension && path.exists()
    }
}

/// An existing regular file.
pub fn is_file(value: &str) -> bool {
    fs::metadata(value)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

pub fn is_url(value: &str) -> bool {
    URL_PATTERN.is_match(value)
}
