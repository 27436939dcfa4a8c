//! Domain models for bundles and the items they launch.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Kind of launch performed for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Launch an executable at a filesystem path.
    App,
    /// Open a file with the default handler.
    File,
    /// Run a command line synchronously.
    Shell,
    /// Open a URL with the default browser.
    Url,
}

impl Action {
    /// Keyword used in source files and in generated code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::App => "app",
            Action::File => "file",
            Action::Shell => "shell",
            Action::Url => "url",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "app" => Ok(Action::App),
            "file" => Ok(Action::File),
            "shell" => Ok(Action::Shell),
            "url" => Ok(Action::Url),
            other => Err(ActionParseError::Unknown(other.to_string())),
        }
    }
}

/// Error returned when parsing an [`Action`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("unknown action '{0}'")]
    Unknown(String),
}

/// A single action/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub action: Action,
    pub value: String,
}

impl Item {
    pub fn new(action: Action, value: impl Into<String>) -> Self {
        Self {
            action,
            value: value.into(),
        }
    }
}

/// A labeled, ordered group of items compiled into one dispatch branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub label: String,
    pub items: Vec<Item>,
}

impl Bundle {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
