use serde::{Deserialize, Serialize};
use std::fmt;

use super::classification::{
    AttributeClassification, CollectionClassification, ElementClassification,
    SingularAttributeClassification,
};
use super::database_model::{ColumnId, TableId};
use super::types::DomainType;

/// A type that declares attributes: an entity, or an embeddable identified by its role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedTypeRef {
    Entity(String),
    Embeddable(String),
}

impl ManagedTypeRef {
    pub fn name(&self) -> &str {
        match self {
            ManagedTypeRef::Entity(name) | ManagedTypeRef::Embeddable(name) => name,
        }
    }
}

impl fmt::Display for ManagedTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingularAttribute {
    pub declaring_type: ManagedTypeRef,
    pub name: String,
    pub classification: SingularAttributeClassification,
    pub attribute_type: DomainType,
    pub columns: Vec<ColumnId>,
    /// Position of the containing table in the owning entity's table list
    pub table_position: usize,
    pub is_identifier: bool,
}

impl SingularAttribute {
    /// Role of the attribute, e.g. `Person.address`.
    pub fn role(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluralAttributeElement {
    pub classification: ElementClassification,
    pub element_type: DomainType,
    pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluralAttributeIndex {
    pub index_type: DomainType,
    pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluralAttribute {
    pub declaring_type: ManagedTypeRef,
    pub name: String,
    pub role: String,
    pub collection_classification: CollectionClassification,
    pub element: PluralAttributeElement,
    pub index: Option<PluralAttributeIndex>,
    /// Foreign key back to the owner, on the collection table (or on the
    /// element entity's primary table for one-to-many)
    pub key_columns: Vec<ColumnId>,
    pub collection_table: Option<TableId>,
}

impl PluralAttribute {
    /// Entity name of the elements, for one-to-many and many-to-many collections.
    pub fn element_entity(&self) -> Option<&str> {
        match &self.element.element_type {
            DomainType::Entity(name) => Some(name),
            _ => None,
        }
    }
}

/// Stored form of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    Singular(SingularAttribute),
    Plural(PluralAttribute),
}

impl Attribute {
    pub fn as_descriptor(&self) -> AttributeDescriptor<'_> {
        match self {
            Attribute::Singular(singular) => AttributeDescriptor::Singular(singular),
            Attribute::Plural(plural) => AttributeDescriptor::Plural(plural),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attribute::Singular(singular) => &singular.name,
            Attribute::Plural(plural) => &plural.name,
        }
    }
}

/// Borrowed view of a resolved attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeDescriptor<'a> {
    Singular(&'a SingularAttribute),
    Plural(&'a PluralAttribute),
}

impl<'a> AttributeDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            AttributeDescriptor::Singular(singular) => &singular.name,
            AttributeDescriptor::Plural(plural) => &plural.name,
        }
    }

    pub fn declaring_type(&self) -> &'a ManagedTypeRef {
        match self {
            AttributeDescriptor::Singular(singular) => &singular.declaring_type,
            AttributeDescriptor::Plural(plural) => &plural.declaring_type,
        }
    }

    pub fn classification(&self) -> AttributeClassification {
        match self {
            AttributeDescriptor::Singular(singular) => {
                AttributeClassification::Singular(singular.classification)
            }
            AttributeDescriptor::Plural(plural) => AttributeClassification::Plural {
                collection: plural.collection_classification,
                element: plural.element.classification,
            },
        }
    }

    pub fn attribute_type(&self) -> DomainType {
        match self {
            AttributeDescriptor::Singular(singular) => singular.attribute_type.clone(),
            AttributeDescriptor::Plural(plural) => DomainType::Collection(plural.role.clone()),
        }
    }

    pub fn as_singular(&self) -> Option<&'a SingularAttribute> {
        match self {
            AttributeDescriptor::Singular(singular) => Some(singular),
            AttributeDescriptor::Plural(_) => None,
        }
    }

    pub fn as_plural(&self) -> Option<&'a PluralAttribute> {
        match self {
            AttributeDescriptor::Plural(plural) => Some(plural),
            AttributeDescriptor::Singular(_) => None,
        }
    }
}
