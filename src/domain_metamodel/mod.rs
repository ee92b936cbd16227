//! Domain metamodel: entity, embeddable and attribute descriptors resolved
//! from entity mappings, plus the database model their columns live in.

pub mod attribute;
pub mod classification;
pub mod config;
pub mod database_model;
pub mod entity;
pub mod errors;
pub mod mapping_info;
pub mod metamodel;
pub mod types;

pub use attribute::{
    Attribute, AttributeDescriptor, ManagedTypeRef, PluralAttribute, SingularAttribute,
};
pub use classification::{
    AttributeClassification, CollectionClassification, ElementClassification,
    SingularAttributeClassification,
};
pub use config::{HierarchyEntityMapping, MetamodelConfig};
pub use database_model::{ColumnExpression, ColumnId, DatabaseModel, TableId, TableReference};
pub use entity::{EmbeddableDescriptor, EntityDescriptor};
pub use errors::MetamodelError;
pub use mapping_info::EntityMappingInfo;
pub use metamodel::{DomainMetamodel, DomainMetamodelBuilder};
pub use types::{sql_types, BasicType, DomainType, JavaType};
