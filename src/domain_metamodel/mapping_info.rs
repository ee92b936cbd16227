//! Capability interface through which the metamodel reads entity mappings.
//!
//! The metamodel never inspects a mapping source's internals. Anything that
//! can describe an entity's ordered tables, identifier and attribute storage
//! implements [`EntityMappingInfo`]; the YAML adapter in
//! [`super::config`] is one such source.

use serde::{Deserialize, Serialize};

use super::types::{AnyType, BasicType, DomainType};

/// Kind of a singular entity-valued association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    ManyToOne,
    /// True one-to-one sharing the owner's primary key; declares no columns
    PrimaryKeyOneToOne,
    /// Logical one-to-one backed by a unique foreign key
    UniqueKeyOneToOne,
}

/// Container types a custom collection may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Set,
    Map,
    List,
    Other,
}

/// Storage shape of a collection as declared by the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionShape {
    Bag,
    IdBag,
    List,
    Array,
    Set,
    OrderedSet,
    SortedSet,
    Map,
    OrderedMap,
    SortedMap,
    Custom(ContainerKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMapping {
    pub embeddable_name: String,
    pub attributes: Vec<AttributeMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementMappedType {
    Basic(BasicType),
    Component(ComponentMapping),
    Any(AnyType),
    Entity {
        target_entity: String,
        /// Association goes through a separate link table
        via_link_table: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMapping {
    pub element_type: ElementMappedType,
    pub columns: Vec<Option<String>>,
    pub formulas: Option<Vec<Option<String>>>,
    pub sql_type_codes: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    pub index_type: DomainType,
    pub columns: Vec<String>,
    pub sql_type_codes: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMapping {
    pub role: String,
    pub shape: CollectionShape,
    /// Link/element table; `None` for foreign-key one-to-many collections
    pub collection_table: Option<String>,
    pub key_columns: Vec<String>,
    pub key_sql_type_codes: Vec<i32>,
    pub element: ElementMapping,
    pub index: Option<IndexMapping>,
}

/// Underlying storage type of an attribute; drives classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappedType {
    Basic(BasicType),
    Component(ComponentMapping),
    Any(AnyType),
    Association {
        target_entity: String,
        kind: AssociationKind,
    },
    Collection(CollectionMapping),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub name: String,
    /// Index into the owning entity's ordered table list
    pub table_number: usize,
    pub columns: Vec<Option<String>>,
    pub formulas: Option<Vec<Option<String>>>,
    pub sql_type_codes: Vec<i32>,
    pub mapped_type: MappedType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierMapping {
    pub name: String,
    pub columns: Vec<String>,
    pub sql_type_codes: Vec<i32>,
    /// `Basic` for simple identifiers, `Component` for composite ones
    pub id_type: MappedType,
}

#[cfg_attr(test, mockall::automock)]
pub trait EntityMappingInfo {
    fn entity_name(&self) -> String;

    fn super_entity_name(&self) -> Option<String>;

    /// Ordered table expressions; index 0 is the entity's primary table.
    fn table_expressions(&self) -> Vec<String>;

    fn identifier(&self) -> IdentifierMapping;

    /// Every attribute reachable from this entity, including ancestor and
    /// descendant state.
    fn attributes(&self) -> Vec<AttributeMapping>;
}
