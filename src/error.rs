//! Initialization error model.
//! Every failure the bootstrap can observe falls into one of three kinds: the shared
//! storage rejected an operation, the reference dataset could not be turned into seed
//! records, or the query engine refused a mapping statement. Component boundaries
//! return these; the coordinator logs them and folds them into a boolean.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitError {
    StorageAccess { code: String, message: String },
    SeedTransform { code: String, message: String },
    CatalogDefinition { code: String, message: String },
}

impl InitError {
    pub fn code_str(&self) -> &str {
        match self {
            InitError::StorageAccess { code, .. }
            | InitError::SeedTransform { code, .. }
            | InitError::CatalogDefinition { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            InitError::StorageAccess { message, .. }
            | InitError::SeedTransform { message, .. }
            | InitError::CatalogDefinition { message, .. } => message.as_str(),
        }
    }

    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { InitError::StorageAccess { code: code.into(), message: msg.into() } }
    pub fn seed<S: Into<String>>(code: S, msg: S) -> Self { InitError::SeedTransform { code: code.into(), message: msg.into() } }
    pub fn catalog<S: Into<String>>(code: S, msg: S) -> Self { InitError::CatalogDefinition { code: code.into(), message: msg.into() } }

    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InitError::StorageAccess { .. } => "storage_access",
            InitError::SeedTransform { .. } => "seed_transform",
            InitError::CatalogDefinition { .. } => "catalog_definition",
        }
    }
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for InitError {}

pub type InitResult<T> = Result<T, InitError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
