//! Attribute classification.
//!
//! Every [`MappedType`] classifies to exactly one variant: singular storage to
//! a [`SingularAttributeClassification`], collections to a
//! (collection, element) classification pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::mapping_info::{
    AssociationKind, CollectionShape, ContainerKind, ElementMappedType, MappedType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SingularAttributeClassification {
    Basic,
    Embedded,
    Any,
    OneToOne,
    ManyToOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionClassification {
    Bag,
    List,
    Set,
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementClassification {
    Basic,
    Embeddable,
    Any,
    OneToMany,
    ManyToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeClassification {
    Singular(SingularAttributeClassification),
    Plural {
        collection: CollectionClassification,
        element: ElementClassification,
    },
}

impl fmt::Display for SingularAttributeClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SingularAttributeClassification::Basic => "BASIC",
            SingularAttributeClassification::Embedded => "EMBEDDED",
            SingularAttributeClassification::Any => "ANY",
            SingularAttributeClassification::OneToOne => "ONE_TO_ONE",
            SingularAttributeClassification::ManyToOne => "MANY_TO_ONE",
        };
        f.write_str(s)
    }
}

pub fn classify(mapped_type: &MappedType) -> AttributeClassification {
    match mapped_type {
        MappedType::Collection(collection) => AttributeClassification::Plural {
            collection: interpret_collection_classification(&collection.shape),
            element: interpret_element_classification(&collection.element.element_type),
        },
        MappedType::Any(_) => AttributeClassification::Singular(SingularAttributeClassification::Any),
        MappedType::Association { kind, .. } => {
            AttributeClassification::Singular(interpret_association_classification(*kind))
        }
        MappedType::Component(_) => {
            AttributeClassification::Singular(SingularAttributeClassification::Embedded)
        }
        MappedType::Basic(_) => AttributeClassification::Singular(SingularAttributeClassification::Basic),
    }
}

pub fn interpret_association_classification(kind: AssociationKind) -> SingularAttributeClassification {
    match kind {
        AssociationKind::PrimaryKeyOneToOne | AssociationKind::UniqueKeyOneToOne => {
            SingularAttributeClassification::OneToOne
        }
        AssociationKind::ManyToOne => SingularAttributeClassification::ManyToOne,
    }
}

pub fn interpret_collection_classification(shape: &CollectionShape) -> CollectionClassification {
    match shape {
        CollectionShape::Bag | CollectionShape::IdBag => CollectionClassification::Bag,
        CollectionShape::List | CollectionShape::Array => CollectionClassification::List,
        CollectionShape::Set | CollectionShape::OrderedSet | CollectionShape::SortedSet => {
            CollectionClassification::Set
        }
        CollectionShape::Map | CollectionShape::OrderedMap | CollectionShape::SortedMap => {
            CollectionClassification::Map
        }
        CollectionShape::Custom(container) => match container {
            ContainerKind::Set => CollectionClassification::Set,
            ContainerKind::Map => CollectionClassification::Map,
            ContainerKind::List => CollectionClassification::List,
            ContainerKind::Other => CollectionClassification::Bag,
        },
    }
}

pub fn interpret_element_classification(element_type: &ElementMappedType) -> ElementClassification {
    match element_type {
        ElementMappedType::Any(_) => ElementClassification::Any,
        ElementMappedType::Component(_) => ElementClassification::Embeddable,
        ElementMappedType::Entity { via_link_table, .. } => {
            if *via_link_table {
                ElementClassification::ManyToMany
            } else {
                ElementClassification::OneToMany
            }
        }
        ElementMappedType::Basic(_) => ElementClassification::Basic,
    }
}

/// Composite identifiers are embedded; everything else is basic.
pub fn interpret_identifier_classification(id_type: &MappedType) -> SingularAttributeClassification {
    match id_type {
        MappedType::Component(_) => SingularAttributeClassification::Embedded,
        _ => SingularAttributeClassification::Basic,
    }
}
