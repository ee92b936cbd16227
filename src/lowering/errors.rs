use thiserror::Error;

use crate::domain_metamodel::errors::MetamodelError;
use crate::sqm::SqmJoinType;

/// Lowering errors. A pass either fully succeeds or fails with one of these;
/// nothing is retried and no partial tree is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoweringError {
    #[error(transparent)]
    Metamodel(#[from] MetamodelError),
    #[error("No from-element with alias `{alias}` is in scope")]
    UnknownFromElement { alias: String },
    #[error("Alias `{alias}` is used by more than one from-element")]
    DuplicateFromElementAlias { alias: String },
    #[error("Join type {join_type:?} is not supported")]
    UnsupportedJoinType { join_type: SqmJoinType },
    #[error("Invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("Attribute `{role}` ({classification}) cannot be joined")]
    NotJoinable { role: String, classification: String },
    #[error("Query has no from-element to select from")]
    EmptyFromClause,
    #[error("Invalid lowering configuration: {message}")]
    InvalidConfig { message: String },
    #[error("Internal lowering fault: expected {expected}, visitor produced {found}")]
    UnexpectedNode {
        expected: &'static str,
        found: &'static str,
    },
}

impl LoweringError {
    pub fn unknown_from_element(alias: impl Into<String>) -> Self {
        LoweringError::UnknownFromElement { alias: alias.into() }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        LoweringError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidPath error with context information
    ///
    /// # Example
    /// ```ignore
    /// LoweringError::path_error_with_context(
    ///     "p.orders",
    ///     "plural attributes must be joined",
    ///     "In SELECT clause"
    /// )
    /// ```
    pub fn path_error_with_context(
        path: impl Into<String>,
        reason: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        LoweringError::InvalidPath {
            path: path.into(),
            reason: format!("{}\n  Context: {}", reason.into(), context.into()),
        }
    }

    /// The metamodel error behind this failure, if any.
    pub fn metamodel_error(&self) -> Option<&MetamodelError> {
        match self {
            LoweringError::Metamodel(err) => Some(err),
            _ => None,
        }
    }
}
