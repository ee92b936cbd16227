//! # Domain Metamodel Error Types
//!
//! Errors raised while building the metamodel from mapping sources and while
//! resolving entity/attribute names against it.
//!
//! ## Error Categories
//!
//! - **Resolution Errors**: unknown entity or attribute names. Reported to the
//!   caller as-is, never recovered.
//! - **Mapping Errors**: classification branches that are not implemented
//!   (`UnsupportedMapping`) and column/formula slot inconsistencies
//!   (`MalformedAttributeMapping`). Both indicate a defect in the mapping
//!   source, not in the query.
//! - **Configuration Errors**: file I/O and YAML parsing issues while loading a
//!   metamodel definition.
//!
//! ## Usage Patterns
//!
//! ```ignore
//! MetamodelError::attribute_error_with_context(
//!     "Person",
//!     "nickname",
//!     "While resolving path p.nickname in WHERE clause"
//! )
//! ```

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetamodelError {
    #[error("No entity named `{entity_name}` is registered in the domain metamodel")]
    UnknownEntity { entity_name: String },
    #[error("Type `{declaring_type}` has no attribute named `{attribute_name}`")]
    UnknownAttribute {
        declaring_type: String,
        attribute_name: String,
    },
    #[error("No collection registered for role `{role}`")]
    UnknownCollection { role: String },
    #[error("Unsupported mapping for `{role}`: {reason}")]
    UnsupportedMapping { role: String, reason: String },
    #[error("Malformed attribute mapping for `{role}`: {reason}")]
    MalformedAttributeMapping { role: String, reason: String },
    #[error("Failed to read metamodel definition: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse metamodel definition: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid metamodel definition: {message}")]
    InvalidConfig { message: String },
}

impl MetamodelError {
    pub fn unknown_entity(entity_name: impl Into<String>) -> Self {
        MetamodelError::UnknownEntity {
            entity_name: entity_name.into(),
        }
    }

    pub fn unknown_attribute(
        declaring_type: impl Into<String>,
        attribute_name: impl Into<String>,
    ) -> Self {
        MetamodelError::UnknownAttribute {
            declaring_type: declaring_type.into(),
            attribute_name: attribute_name.into(),
        }
    }

    pub fn malformed(role: impl Into<String>, reason: impl Into<String>) -> Self {
        MetamodelError::MalformedAttributeMapping {
            role: role.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(role: impl Into<String>, reason: impl Into<String>) -> Self {
        MetamodelError::UnsupportedMapping {
            role: role.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        MetamodelError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an UnknownAttribute error with context information
    ///
    /// # Example
    /// ```ignore
    /// MetamodelError::attribute_error_with_context(
    ///     "Person",
    ///     "nickname",
    ///     "In path expression p.nickname"
    /// )
    /// ```
    pub fn attribute_error_with_context(
        declaring_type: impl Into<String>,
        attribute_name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        let name = attribute_name.into();
        let ctx = context.into();
        MetamodelError::UnknownAttribute {
            declaring_type: declaring_type.into(),
            attribute_name: format!("{}\n  Context: {}", name, ctx),
        }
    }

    /// Is this one of the name-resolution failures (as opposed to a mapping defect)?
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            MetamodelError::UnknownEntity { .. }
                | MetamodelError::UnknownAttribute { .. }
                | MetamodelError::UnknownCollection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_appended_to_attribute_name() {
        let err = MetamodelError::attribute_error_with_context("Person", "nick", "WHERE p.nick");
        let msg = err.to_string();
        assert!(msg.contains("`Person`"));
        assert!(msg.contains("nick\n  Context: WHERE p.nick"));
        assert!(err.is_resolution_error());
    }

    #[test]
    fn test_mapping_errors_are_not_resolution_errors() {
        assert!(!MetamodelError::malformed("Person.name", "x").is_resolution_error());
        assert!(!MetamodelError::unsupported("Person.owner", "any").is_resolution_error());
    }
}
