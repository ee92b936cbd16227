use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::attribute::{Attribute, AttributeDescriptor, SingularAttribute};
use super::database_model::TableId;

/// Resolved descriptor of one entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub super_entity: Option<String>,
    /// Backing tables in declaration order; index 0 is the primary table
    pub tables: Vec<TableId>,
    pub identifier: SingularAttribute,
    attributes: Vec<Attribute>,
    #[serde(skip)]
    attribute_index: HashMap<String, usize>,
}

impl EntityDescriptor {
    pub(crate) fn new(
        name: String,
        super_entity: Option<String>,
        tables: Vec<TableId>,
        identifier: SingularAttribute,
    ) -> Self {
        EntityDescriptor {
            name,
            super_entity,
            tables,
            identifier,
            attributes: Vec::new(),
            attribute_index: HashMap::new(),
        }
    }

    pub(crate) fn add_attribute(&mut self, attribute: Attribute) {
        self.attribute_index
            .insert(attribute.name().to_string(), self.attributes.len());
        self.attributes.push(attribute);
    }

    pub fn primary_table(&self) -> TableId {
        self.tables[0]
    }

    /// Find an attribute by name. The identifier answers to its own name and
    /// to `id` unless a regular attribute named `id` exists.
    pub fn find_attribute(&self, name: &str) -> Option<AttributeDescriptor<'_>> {
        if let Some(index) = self.attribute_index.get(name) {
            return Some(self.attributes[*index].as_descriptor());
        }
        if name == self.identifier.name || name == "id" {
            return Some(AttributeDescriptor::Singular(&self.identifier));
        }
        None
    }

    /// Attributes in mapping order (identifier excluded).
    pub fn attributes(&self) -> impl Iterator<Item = AttributeDescriptor<'_>> {
        self.attributes.iter().map(Attribute::as_descriptor)
    }
}

/// Embeddable (component) type as used by one embedded attribute, keyed by role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddableDescriptor {
    pub role: String,
    pub embeddable_name: String,
    attributes: Vec<Attribute>,
}

impl EmbeddableDescriptor {
    pub(crate) fn new(role: String, embeddable_name: String, attributes: Vec<Attribute>) -> Self {
        EmbeddableDescriptor {
            role,
            embeddable_name,
            attributes,
        }
    }

    pub fn find_attribute(&self, name: &str) -> Option<AttributeDescriptor<'_>> {
        self.attributes
            .iter()
            .find(|a| a.name() == name)
            .map(Attribute::as_descriptor)
    }

    pub fn attributes(&self) -> impl Iterator<Item = AttributeDescriptor<'_>> {
        self.attributes.iter().map(Attribute::as_descriptor)
    }
}
