//! The domain metamodel and its build phase.
//!
//! [`DomainMetamodelBuilder`] collects entity mappings and resolves them in
//! two phases: identifiers first (every entity must exist before one-to-one
//! associations can borrow an owner's identifier columns), then attributes.
//! The resulting [`DomainMetamodel`] is immutable and safe to share across
//! concurrent lowering passes.

use std::collections::HashMap;

use super::attribute::{
    Attribute, AttributeDescriptor, ManagedTypeRef, PluralAttribute, PluralAttributeElement,
    PluralAttributeIndex, SingularAttribute,
};
use super::classification::{
    interpret_association_classification, interpret_collection_classification,
    interpret_element_classification, interpret_identifier_classification,
    CollectionClassification, ElementClassification, SingularAttributeClassification,
};
use super::database_model::{ColumnId, DatabaseModel, TableId};
use super::entity::{EmbeddableDescriptor, EntityDescriptor};
use super::errors::MetamodelError;
use super::mapping_info::{
    AssociationKind, AttributeMapping, CollectionMapping, ComponentMapping, ElementMappedType,
    EntityMappingInfo, IdentifierMapping, MappedType,
};
use super::types::DomainType;

#[derive(Debug, Clone)]
pub struct DomainMetamodel {
    database: DatabaseModel,
    entities: HashMap<String, EntityDescriptor>,
    entity_order: Vec<String>,
    embeddables: HashMap<String, EmbeddableDescriptor>,
    collections: HashMap<String, PluralAttribute>,
}

impl DomainMetamodel {
    pub fn builder() -> DomainMetamodelBuilder {
        DomainMetamodelBuilder::new()
    }

    pub fn resolve_entity_type(&self, entity_name: &str) -> Result<&EntityDescriptor, MetamodelError> {
        self.entities
            .get(entity_name)
            .ok_or_else(|| MetamodelError::unknown_entity(entity_name))
    }

    pub fn resolve_embeddable(&self, role: &str) -> Result<&EmbeddableDescriptor, MetamodelError> {
        self.embeddables
            .get(role)
            .ok_or_else(|| MetamodelError::invalid_config(format!("no embeddable registered for role `{}`", role)))
    }

    pub fn resolve_attribute(
        &self,
        declaring_type: &ManagedTypeRef,
        attribute_name: &str,
    ) -> Result<AttributeDescriptor<'_>, MetamodelError> {
        let found = match declaring_type {
            ManagedTypeRef::Entity(name) => self.resolve_entity_type(name)?.find_attribute(attribute_name),
            ManagedTypeRef::Embeddable(role) => self.resolve_embeddable(role)?.find_attribute(attribute_name),
        };
        found.ok_or_else(|| MetamodelError::unknown_attribute(declaring_type.name(), attribute_name))
    }

    pub fn resolve_collection(&self, role: &str) -> Result<&PluralAttribute, MetamodelError> {
        self.collections
            .get(role)
            .ok_or_else(|| MetamodelError::UnknownCollection {
                role: role.to_string(),
            })
    }

    pub fn database(&self) -> &DatabaseModel {
        &self.database
    }

    /// Entity names in registration order.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entity_order.iter().map(String::as_str)
    }
}

/// Snapshot of one entity's mapping, taken at registration time.
struct PendingEntity {
    name: String,
    super_entity: Option<String>,
    tables: Vec<TableId>,
    identifier: IdentifierMapping,
    attributes: Vec<AttributeMapping>,
}

#[derive(Default)]
pub struct DomainMetamodelBuilder {
    database: DatabaseModel,
    pending: Vec<PendingEntity>,
}

impl DomainMetamodelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entity(&mut self, mapping: &dyn EntityMappingInfo) -> Result<(), MetamodelError> {
        let name = mapping.entity_name();
        if self.pending.iter().any(|p| p.name == name) {
            return Err(MetamodelError::invalid_config(format!(
                "entity `{}` registered twice",
                name
            )));
        }

        let table_expressions = mapping.table_expressions();
        if table_expressions.is_empty() {
            return Err(MetamodelError::malformed(
                name,
                "entity mapping declares no tables",
            ));
        }
        let tables: Vec<TableId> = table_expressions
            .iter()
            .map(|expr| self.database.table_for_expression(expr))
            .collect();

        log::debug!(
            "DomainMetamodelBuilder: registering entity '{}' over tables {:?}",
            name,
            table_expressions
        );

        self.pending.push(PendingEntity {
            name,
            super_entity: mapping.super_entity_name(),
            tables,
            identifier: mapping.identifier(),
            attributes: mapping.attributes(),
        });
        Ok(())
    }

    pub fn build(self) -> Result<DomainMetamodel, MetamodelError> {
        let DomainMetamodelBuilder {
            mut database,
            pending,
        } = self;
        let mut entities: HashMap<String, EntityDescriptor> = HashMap::new();
        let mut embeddables = HashMap::new();
        let mut collections = HashMap::new();

        for entity in &pending {
            if let Some(super_name) = &entity.super_entity {
                if !pending.iter().any(|p| &p.name == super_name) {
                    return Err(MetamodelError::invalid_config(format!(
                        "entity `{}` extends unknown entity `{}`",
                        entity.name, super_name
                    )));
                }
            }
        }

        // Phase 1: identifiers
        let no_entities = HashMap::new();
        for entity in &pending {
            let identifier = AttributeFactory {
                database: &mut database,
                entities: &no_entities,
                embeddables: &mut embeddables,
                collections: &mut collections,
            }
            .build_identifier(entity)?;
            entities.insert(
                entity.name.clone(),
                EntityDescriptor::new(
                    entity.name.clone(),
                    entity.super_entity.clone(),
                    entity.tables.clone(),
                    identifier,
                ),
            );
        }

        // Phase 2: state attributes, now that every entity is known
        let mut built: Vec<(String, Vec<Attribute>)> = Vec::with_capacity(pending.len());
        for entity in &pending {
            let owner = OwnerContext {
                declaring_type: ManagedTypeRef::Entity(entity.name.clone()),
                tables: entity.tables.clone(),
                identifier_columns: entities[&entity.name].identifier.columns.clone(),
            };
            let mut factory = AttributeFactory {
                database: &mut database,
                entities: &entities,
                embeddables: &mut embeddables,
                collections: &mut collections,
            };
            let mut attributes = Vec::with_capacity(entity.attributes.len());
            for mapping in &entity.attributes {
                attributes.push(factory.build_attribute(&owner, mapping)?);
            }
            built.push((entity.name.clone(), attributes));
        }
        for (name, attributes) in built {
            if let Some(descriptor) = entities.get_mut(&name) {
                for attribute in attributes {
                    descriptor.add_attribute(attribute);
                }
            }
        }

        log::info!(
            "Domain metamodel built: {} entities, {} embeddables, {} collections, {} tables",
            entities.len(),
            embeddables.len(),
            collections.len(),
            database.tables().len()
        );

        Ok(DomainMetamodel {
            database,
            entities,
            entity_order: pending.into_iter().map(|p| p.name).collect(),
            embeddables,
            collections,
        })
    }
}

struct OwnerContext {
    declaring_type: ManagedTypeRef,
    tables: Vec<TableId>,
    /// Identifier columns of the owning entity
    identifier_columns: Vec<ColumnId>,
}

struct AttributeFactory<'m> {
    database: &'m mut DatabaseModel,
    entities: &'m HashMap<String, EntityDescriptor>,
    embeddables: &'m mut HashMap<String, EmbeddableDescriptor>,
    collections: &'m mut HashMap<String, PluralAttribute>,
}

impl AttributeFactory<'_> {
    fn build_identifier(&mut self, entity: &PendingEntity) -> Result<SingularAttribute, MetamodelError> {
        let mapping = &entity.identifier;
        let role = format!("{}.{}", entity.name, mapping.name);
        let table = entity.tables[0];
        let slots: Vec<Option<String>> = mapping.columns.iter().cloned().map(Some).collect();
        let columns = self
            .database
            .make_values(&role, table, &slots, None, &mapping.sql_type_codes)?;
        if columns.is_empty() {
            return Err(MetamodelError::malformed(role, "identifier maps no columns"));
        }

        let attribute_type = match &mapping.id_type {
            MappedType::Basic(basic) => DomainType::Basic(basic.clone()),
            MappedType::Component(component) => {
                let owner = OwnerContext {
                    declaring_type: ManagedTypeRef::Entity(entity.name.clone()),
                    tables: entity.tables.clone(),
                    identifier_columns: columns.clone(),
                };
                self.register_embeddable(&owner, &role, component)?;
                DomainType::Embeddable(role.clone())
            }
            other => {
                return Err(MetamodelError::unsupported(
                    role,
                    format!("identifier type {:?} is neither basic nor composite", other),
                ))
            }
        };

        Ok(SingularAttribute {
            declaring_type: ManagedTypeRef::Entity(entity.name.clone()),
            name: mapping.name.clone(),
            classification: interpret_identifier_classification(&mapping.id_type),
            attribute_type,
            columns,
            table_position: 0,
            is_identifier: true,
        })
    }

    fn build_attribute(
        &mut self,
        owner: &OwnerContext,
        mapping: &AttributeMapping,
    ) -> Result<Attribute, MetamodelError> {
        let role = format!("{}.{}", owner.declaring_type, mapping.name);
        let table = *owner.tables.get(mapping.table_number).ok_or_else(|| {
            MetamodelError::malformed(
                &role,
                format!(
                    "table number {} out of range for {} table(s)",
                    mapping.table_number,
                    owner.tables.len()
                ),
            )
        })?;

        log::trace!("AttributeFactory: building '{}' on table {:?}", role, table);

        let singular = |classification, attribute_type, columns| {
            Attribute::Singular(SingularAttribute {
                declaring_type: owner.declaring_type.clone(),
                name: mapping.name.clone(),
                classification,
                attribute_type,
                columns,
                table_position: mapping.table_number,
                is_identifier: false,
            })
        };

        match &mapping.mapped_type {
            MappedType::Collection(collection) => {
                let plural = self.build_plural(owner, &mapping.name, collection)?;
                Ok(Attribute::Plural(plural))
            }
            MappedType::Any(any) => {
                let columns = self.make_values(&role, table, mapping)?;
                log::warn!(
                    "Attribute '{}' is an ANY mapping; references to it cannot be lowered",
                    role
                );
                Ok(singular(
                    SingularAttributeClassification::Any,
                    DomainType::Any(any.clone()),
                    columns,
                ))
            }
            MappedType::Component(component) => {
                let columns = self.make_values(&role, table, mapping)?;
                self.register_embeddable(owner, &role, component)?;
                Ok(singular(
                    SingularAttributeClassification::Embedded,
                    DomainType::Embeddable(role.clone()),
                    columns,
                ))
            }
            MappedType::Basic(basic) => {
                let columns = self.make_values(&role, table, mapping)?;
                if columns.is_empty() {
                    return Err(MetamodelError::malformed(role, "basic attribute maps no columns"));
                }
                Ok(singular(
                    SingularAttributeClassification::Basic,
                    DomainType::Basic(basic.clone()),
                    columns,
                ))
            }
            MappedType::Association {
                target_entity,
                kind,
            } => {
                if !self.entities.contains_key(target_entity) {
                    return Err(MetamodelError::unknown_entity(target_entity));
                }
                let classification = interpret_association_classification(*kind);
                let (columns, table_position) = if *kind == AssociationKind::PrimaryKeyOneToOne {
                    // shares the owner's primary key, so it lives on the owner's primary table
                    if !mapping.columns.is_empty() {
                        return Err(MetamodelError::malformed(
                            role,
                            "primary-key one-to-one must not declare its own columns",
                        ));
                    }
                    (owner.identifier_columns.clone(), 0)
                } else {
                    (self.make_values(&role, table, mapping)?, mapping.table_number)
                };
                if columns.is_empty() {
                    return Err(MetamodelError::malformed(
                        role,
                        "association resolved to no columns",
                    ));
                }
                Ok(Attribute::Singular(SingularAttribute {
                    declaring_type: owner.declaring_type.clone(),
                    name: mapping.name.clone(),
                    classification,
                    attribute_type: DomainType::Entity(target_entity.clone()),
                    columns,
                    table_position,
                    is_identifier: false,
                }))
            }
        }
    }

    fn make_values(
        &mut self,
        role: &str,
        table: TableId,
        mapping: &AttributeMapping,
    ) -> Result<Vec<ColumnId>, MetamodelError> {
        self.database.make_values(
            role,
            table,
            &mapping.columns,
            mapping.formulas.as_deref(),
            &mapping.sql_type_codes,
        )
    }

    fn register_embeddable(
        &mut self,
        owner: &OwnerContext,
        role: &str,
        component: &ComponentMapping,
    ) -> Result<(), MetamodelError> {
        // sub-attributes are declared by the embeddable, but keep the owner's tables and identifier
        let embeddable_owner = OwnerContext {
            declaring_type: ManagedTypeRef::Embeddable(role.to_string()),
            tables: owner.tables.clone(),
            identifier_columns: owner.identifier_columns.clone(),
        };
        let mut attributes = Vec::with_capacity(component.attributes.len());
        for sub in &component.attributes {
            let attribute = self.build_attribute(&embeddable_owner, sub)?;
            if matches!(attribute, Attribute::Plural(_)) {
                return Err(MetamodelError::unsupported(
                    format!("{}.{}", role, sub.name),
                    "collections nested in embeddables",
                ));
            }
            attributes.push(attribute);
        }
        self.embeddables.entry(role.to_string()).or_insert_with(|| {
            EmbeddableDescriptor::new(role.to_string(), component.embeddable_name.clone(), attributes)
        });
        Ok(())
    }

    fn build_plural(
        &mut self,
        owner: &OwnerContext,
        name: &str,
        mapping: &CollectionMapping,
    ) -> Result<PluralAttribute, MetamodelError> {
        let role = mapping.role.as_str();
        let collection_classification = interpret_collection_classification(&mapping.shape);
        let element_classification = interpret_element_classification(&mapping.element.element_type);
        let collection_table = mapping
            .collection_table
            .as_deref()
            .map(|expr| self.database.table_for_expression(expr));

        // table holding the key, element and index slots
        let slot_table = match (&mapping.element.element_type, collection_table) {
            (ElementMappedType::Entity { target_entity, via_link_table }, table) => {
                let target = self
                    .entities
                    .get(target_entity)
                    .ok_or_else(|| MetamodelError::unknown_entity(target_entity))?;
                match (*via_link_table, table) {
                    (true, Some(link)) => link,
                    (true, None) => {
                        return Err(MetamodelError::malformed(
                            role,
                            "many-to-many collection requires a link table",
                        ))
                    }
                    (false, None) => target.primary_table(),
                    (false, Some(_)) => {
                        return Err(MetamodelError::malformed(
                            role,
                            "one-to-many collection is keyed on the element table and takes no collection table",
                        ))
                    }
                }
            }
            (_, Some(table)) => table,
            (_, None) => {
                return Err(MetamodelError::malformed(
                    role,
                    "element collection requires a collection table",
                ))
            }
        };

        let key_slots: Vec<Option<String>> = mapping.key_columns.iter().cloned().map(Some).collect();
        let key_columns =
            self.database
                .make_values(role, slot_table, &key_slots, None, &mapping.key_sql_type_codes)?;
        if key_columns.is_empty() {
            return Err(MetamodelError::malformed(role, "collection key maps no columns"));
        }

        let element_type = match &mapping.element.element_type {
            ElementMappedType::Basic(basic) => DomainType::Basic(basic.clone()),
            ElementMappedType::Any(any) => DomainType::Any(any.clone()),
            ElementMappedType::Entity { target_entity, .. } => DomainType::Entity(target_entity.clone()),
            ElementMappedType::Component(component) => {
                let element_role = format!("{}.{{element}}", role);
                let element_owner = OwnerContext {
                    declaring_type: owner.declaring_type.clone(),
                    tables: vec![slot_table],
                    identifier_columns: owner.identifier_columns.clone(),
                };
                self.register_embeddable(&element_owner, &element_role, component)?;
                DomainType::Embeddable(element_role)
            }
        };

        let mut element_columns = self.database.make_values(
            role,
            slot_table,
            &mapping.element.columns,
            mapping.element.formulas.as_deref(),
            &mapping.element.sql_type_codes,
        )?;
        if element_columns.is_empty() && element_classification == ElementClassification::OneToMany {
            // one-to-many elements are identified by the element entity's own identifier
            if let DomainType::Entity(target) = &element_type {
                element_columns = self.entities[target].identifier.columns.clone();
            }
        }
        if element_columns.is_empty() {
            return Err(MetamodelError::malformed(role, "collection element maps no columns"));
        }

        let index = match &mapping.index {
            Some(index) => {
                let slots: Vec<Option<String>> = index.columns.iter().cloned().map(Some).collect();
                let columns =
                    self.database
                        .make_values(role, slot_table, &slots, None, &index.sql_type_codes)?;
                Some(PluralAttributeIndex {
                    index_type: index.index_type.clone(),
                    columns,
                })
            }
            None => None,
        };
        let indexed = matches!(
            collection_classification,
            CollectionClassification::List | CollectionClassification::Map
        );
        if indexed && index.is_none() {
            return Err(MetamodelError::malformed(
                role,
                format!("{:?} collection requires an index mapping", collection_classification),
            ));
        }

        let plural = PluralAttribute {
            declaring_type: owner.declaring_type.clone(),
            name: name.to_string(),
            role: role.to_string(),
            collection_classification,
            element: PluralAttributeElement {
                classification: element_classification,
                element_type,
                columns: element_columns,
            },
            index,
            key_columns,
            collection_table,
        };
        // inherited collections show up once per entity of the hierarchy under the same role
        self.collections
            .entry(role.to_string())
            .or_insert_with(|| plural.clone());
        Ok(plural)
    }
}
