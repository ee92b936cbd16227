use super::errors::MetamodelError;
use super::mapping_info::{
    AssociationKind, AttributeMapping, CollectionMapping, CollectionShape, ComponentMapping,
    ElementMappedType, ElementMapping, EntityMappingInfo, IdentifierMapping, IndexMapping,
    MappedType,
};
use super::metamodel::DomainMetamodel;
use super::types::{AnyType, BasicType, DomainType, EnumStorage, JavaType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Domain metamodels are defined in YAML with the following structure:
///
/// ```yaml
/// name: shop                  # Optional metamodel name
/// entities:
///   - name: Base              # Entity name
///     table: base             # Primary table
///     inheritance: joined     # joined | single_table (hierarchy roots only)
///     identifier:
///       name: id
///       columns: [id]
///       type: long
///     attributes:
///       - kind: basic
///         name: description
///         type: string
///         column: description
///   - name: Branch
///     extends: Base           # Subclass of Base, joined on its own table
///     table: branch
///     key_columns: [base_id]  # Identifier columns on the subclass table
/// embeddables:
///   - name: Address
///     attributes:
///       - { kind: basic, name: street, type: string }
/// ```
///
/// Attribute kinds: `basic`, `embedded`, `any`, `many_to_one`, `one_to_one`,
/// `one_to_many`, `many_to_many`, `element_collection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetamodelConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub entities: Vec<EntityDefinition>,
    #[serde(default)]
    pub embeddables: Vec<EmbeddableDefinition>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceStrategy {
    #[default]
    Joined,
    SingleTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    /// Primary table; optional for single-table subclasses
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub secondary_tables: Vec<String>,
    /// Only read on hierarchy roots
    #[serde(default)]
    pub inheritance: Option<InheritanceStrategy>,
    /// Declared on hierarchy roots only
    #[serde(default)]
    pub identifier: Option<IdentifierDefinition>,
    /// Identifier column names on a joined subclass table (defaults to the root's)
    #[serde(default)]
    pub key_columns: Option<Vec<String>>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

fn default_identifier_name() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierDefinition {
    #[serde(default = "default_identifier_name")]
    pub name: String,
    /// Defaults to the embeddable's columns for composite identifiers
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    /// Composite identifier type
    #[serde(default)]
    pub embeddable: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddableDefinition {
    pub name: String,
    pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumStorageDefinition {
    Ordinal,
    String,
    NationalizedString,
}

impl From<EnumStorageDefinition> for EnumStorage {
    fn from(definition: EnumStorageDefinition) -> Self {
        match definition {
            EnumStorageDefinition::Ordinal => EnumStorage::Ordinal,
            EnumStorageDefinition::String => EnumStorage::String {
                nationalized: false,
            },
            EnumStorageDefinition::NationalizedString => EnumStorage::String { nationalized: true },
        }
    }
}

fn default_basic_type() -> String {
    "string".to_string()
}

fn default_index_type() -> String {
    "integer".to_string()
}

fn default_shape() -> CollectionShape {
    CollectionShape::Bag
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAttributeDefinition {
    pub name: String,
    /// Type name, or the enum name when `enum_storage` is set
    #[serde(default = "default_basic_type", rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub sql_type: Option<i32>,
    #[serde(default)]
    pub converter: Option<String>,
    #[serde(default)]
    pub enum_storage: Option<EnumStorageDefinition>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedAttributeDefinition {
    pub name: String,
    pub embeddable: String,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyAttributeDefinition {
    pub name: String,
    pub discriminator_column: String,
    pub identifier_column: String,
    #[serde(default = "default_basic_type")]
    pub discriminator_type: String,
    #[serde(default = "default_any_identifier_type")]
    pub identifier_type: String,
    #[serde(default)]
    pub table: Option<String>,
}

fn default_any_identifier_type() -> String {
    "long".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToOneDefinition {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Shares the owner's primary key (one_to_one only)
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub columns: Vec<String>,
    #[serde(default = "default_index_type", rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneToManyDefinition {
    pub name: String,
    pub target: String,
    pub key_columns: Vec<String>,
    #[serde(default = "default_shape")]
    pub shape: CollectionShape,
    #[serde(default)]
    pub index: Option<IndexDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManyToManyDefinition {
    pub name: String,
    pub target: String,
    pub collection_table: String,
    pub key_columns: Vec<String>,
    pub element_columns: Vec<String>,
    #[serde(default = "default_shape")]
    pub shape: CollectionShape,
    #[serde(default)]
    pub index: Option<IndexDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementDefinition {
    Basic {
        #[serde(default = "default_basic_type", rename = "type")]
        type_name: String,
        #[serde(default)]
        column: Option<String>,
        #[serde(default)]
        sql_type: Option<i32>,
        #[serde(default)]
        enum_storage: Option<EnumStorageDefinition>,
    },
    Embeddable {
        embeddable: String,
    },
    Any {
        discriminator_column: String,
        identifier_column: String,
        #[serde(default = "default_basic_type")]
        discriminator_type: String,
        #[serde(default = "default_any_identifier_type")]
        identifier_type: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementCollectionDefinition {
    pub name: String,
    pub collection_table: String,
    pub key_columns: Vec<String>,
    pub element: ElementDefinition,
    #[serde(default = "default_shape")]
    pub shape: CollectionShape,
    #[serde(default)]
    pub index: Option<IndexDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeDefinition {
    Basic(BasicAttributeDefinition),
    Embedded(EmbeddedAttributeDefinition),
    Any(AnyAttributeDefinition),
    ManyToOne(ToOneDefinition),
    OneToOne(ToOneDefinition),
    OneToMany(OneToManyDefinition),
    ManyToMany(ManyToManyDefinition),
    ElementCollection(ElementCollectionDefinition),
}

impl AttributeDefinition {
    pub fn name(&self) -> &str {
        match self {
            AttributeDefinition::Basic(d) => &d.name,
            AttributeDefinition::Embedded(d) => &d.name,
            AttributeDefinition::Any(d) => &d.name,
            AttributeDefinition::ManyToOne(d) | AttributeDefinition::OneToOne(d) => &d.name,
            AttributeDefinition::OneToMany(d) => &d.name,
            AttributeDefinition::ManyToMany(d) => &d.name,
            AttributeDefinition::ElementCollection(d) => &d.name,
        }
    }

    /// Explicit containing table, for singular attributes.
    fn table(&self) -> Option<&str> {
        match self {
            AttributeDefinition::Basic(d) => d.table.as_deref(),
            AttributeDefinition::Embedded(d) => d.table.as_deref(),
            AttributeDefinition::Any(d) => d.table.as_deref(),
            AttributeDefinition::ManyToOne(d) | AttributeDefinition::OneToOne(d) => d.table.as_deref(),
            _ => None,
        }
    }

    fn is_plural(&self) -> bool {
        matches!(
            self,
            AttributeDefinition::OneToMany(_)
                | AttributeDefinition::ManyToMany(_)
                | AttributeDefinition::ElementCollection(_)
        )
    }
}

impl MetamodelConfig {
    /// Load metamodel definition from YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, MetamodelError> {
        let contents = fs::read_to_string(path).map_err(|e| MetamodelError::ConfigReadError {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse metamodel definition from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MetamodelError> {
        serde_yaml::from_str(yaml).map_err(|e| MetamodelError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Structural validation of the definition.
    pub fn validate(&self) -> Result<(), MetamodelError> {
        if self.entities.is_empty() {
            return Err(MetamodelError::invalid_config(
                "Metamodel must contain at least one entity definition",
            ));
        }

        let mut seen_embeddables = HashSet::new();
        for embeddable in &self.embeddables {
            if !seen_embeddables.insert(embeddable.name.as_str()) {
                return Err(MetamodelError::invalid_config(format!(
                    "Duplicate embeddable definition: {}",
                    embeddable.name
                )));
            }
        }

        let hierarchy = Hierarchy::new(self)?;
        for entity in &self.entities {
            let root = hierarchy.root(entity)?;
            if entity.extends.is_some() && entity.identifier.is_some() {
                return Err(MetamodelError::invalid_config(format!(
                    "Entity `{}` is a subclass and must not declare an identifier",
                    entity.name
                )));
            }
            if root.identifier.is_none() {
                return Err(MetamodelError::invalid_config(format!(
                    "Hierarchy root `{}` declares no identifier",
                    root.name
                )));
            }
            if entity.extends.is_some() && entity.inheritance.is_some() {
                log::warn!(
                    "Entity '{}' declares an inheritance strategy; only the hierarchy root's is used",
                    entity.name
                );
            }
            hierarchy.own_tables(entity)?;
        }

        // attribute names are shared by every entity in a hierarchy
        for root in self.entities.iter().filter(|e| e.extends.is_none()) {
            let identifier_name = root
                .identifier
                .as_ref()
                .map(|id| id.name.as_str())
                .unwrap_or("id");
            let mut seen = HashSet::new();
            seen.insert(identifier_name);
            let mut members = vec![root];
            members.extend(hierarchy.descendants(root));
            for member in members {
                for attribute in &member.attributes {
                    if !seen.insert(attribute.name()) {
                        return Err(MetamodelError::invalid_config(format!(
                            "Attribute name `{}` on entity `{}` collides with another attribute in the `{}` hierarchy",
                            attribute.name(),
                            member.name,
                            root.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// One mapping adapter per entity, in declaration order.
    pub fn entity_mappings(&self) -> Result<Vec<HierarchyEntityMapping>, MetamodelError> {
        self.validate()?;
        let hierarchy = Hierarchy::new(self)?;
        self.entities
            .iter()
            .map(|entity| HierarchyEntityMapping::resolve(&hierarchy, entity))
            .collect()
    }

    pub fn build_metamodel(&self) -> Result<DomainMetamodel, MetamodelError> {
        let mut builder = DomainMetamodel::builder();
        for mapping in self.entity_mappings()? {
            builder.register_entity(&mapping)?;
        }
        builder.build()
    }
}

/// [`EntityMappingInfo`] adapter over one entity of a YAML-defined hierarchy.
///
/// Everything the trait exposes is resolved eagerly by [`Self::resolve`], so
/// configuration defects surface as errors before the metamodel build starts.
#[derive(Debug, Clone)]
pub struct HierarchyEntityMapping {
    entity_name: String,
    super_entity_name: Option<String>,
    table_expressions: Vec<String>,
    identifier: IdentifierMapping,
    attributes: Vec<AttributeMapping>,
}

impl HierarchyEntityMapping {
    fn resolve<'c>(hierarchy: &Hierarchy<'c>, entity: &'c EntityDefinition) -> Result<Self, MetamodelError> {
        let table_expressions = hierarchy.table_order(entity)?;
        let identifier = hierarchy.identifier_mapping(entity)?;

        // own state first, then ancestors nearest-first, then descendants
        let mut declaring = vec![entity];
        declaring.extend(hierarchy.ancestors(entity)?);
        declaring.extend(hierarchy.descendants(entity));

        let mut attributes = Vec::new();
        for declarer in declaring {
            let declarer_tables = hierarchy.own_tables(declarer)?;
            for definition in &declarer.attributes {
                let table_name = match definition.table() {
                    Some(table) => {
                        if !declarer_tables.iter().any(|t| t == table) {
                            return Err(MetamodelError::invalid_config(format!(
                                "Attribute `{}.{}` names table `{}` which is not one of the entity's own tables",
                                declarer.name,
                                definition.name(),
                                table
                            )));
                        }
                        table.to_string()
                    }
                    None => declarer_tables[0].clone(),
                };
                let table_number = table_expressions
                    .iter()
                    .position(|t| *t == table_name)
                    .ok_or_else(|| {
                        MetamodelError::invalid_config(format!(
                            "Table `{}` is not part of entity `{}`",
                            table_name, entity.name
                        ))
                    })?;
                attributes.push(hierarchy.attribute_mapping(
                    &declarer.name,
                    definition,
                    table_number,
                    false,
                )?);
            }
        }

        log::debug!(
            "HierarchyEntityMapping: '{}' resolved to tables {:?} with {} attribute(s)",
            entity.name,
            table_expressions,
            attributes.len()
        );

        Ok(HierarchyEntityMapping {
            entity_name: entity.name.clone(),
            super_entity_name: entity.extends.clone(),
            table_expressions,
            identifier,
            attributes,
        })
    }
}

impl EntityMappingInfo for HierarchyEntityMapping {
    fn entity_name(&self) -> String {
        self.entity_name.clone()
    }

    fn super_entity_name(&self) -> Option<String> {
        self.super_entity_name.clone()
    }

    fn table_expressions(&self) -> Vec<String> {
        self.table_expressions.clone()
    }

    fn identifier(&self) -> IdentifierMapping {
        self.identifier.clone()
    }

    fn attributes(&self) -> Vec<AttributeMapping> {
        self.attributes.clone()
    }
}

fn parse_type(type_name: &str, context: &str) -> Result<JavaType, MetamodelError> {
    JavaType::from_type_name(type_name).ok_or_else(|| {
        MetamodelError::invalid_config(format!("Unknown type `{}` for `{}`", type_name, context))
    })
}

fn basic_type(
    type_name: &str,
    enum_storage: Option<EnumStorageDefinition>,
    sql_type: Option<i32>,
    converter: Option<String>,
    context: &str,
) -> Result<BasicType, MetamodelError> {
    let java_type = match enum_storage {
        Some(storage) => JavaType::Enum {
            name: type_name.to_string(),
            storage: storage.into(),
        },
        None => parse_type(type_name, context)?,
    };
    let mut basic = match sql_type {
        Some(code) => BasicType::with_sql_type(java_type, code),
        None => BasicType::standard(java_type),
    };
    basic.converter = converter;
    Ok(basic)
}

fn any_type(discriminator: &str, identifier: &str, context: &str) -> Result<AnyType, MetamodelError> {
    Ok(AnyType {
        discriminator_type: BasicType::standard(parse_type(discriminator, context)?),
        identifier_type: BasicType::standard(parse_type(identifier, context)?),
    })
}

fn some_columns(columns: &[String]) -> Vec<Option<String>> {
    columns.iter().cloned().map(Some).collect()
}

/// Entity definitions indexed for hierarchy walks.
struct Hierarchy<'c> {
    config: &'c MetamodelConfig,
    entities: HashMap<&'c str, &'c EntityDefinition>,
    embeddables: HashMap<&'c str, &'c EmbeddableDefinition>,
}

impl<'c> Hierarchy<'c> {
    fn new(config: &'c MetamodelConfig) -> Result<Self, MetamodelError> {
        let mut entities = HashMap::new();
        for entity in &config.entities {
            if entities.insert(entity.name.as_str(), entity).is_some() {
                return Err(MetamodelError::invalid_config(format!(
                    "Duplicate entity definition: {}",
                    entity.name
                )));
            }
        }
        let embeddables = config
            .embeddables
            .iter()
            .map(|e| (e.name.as_str(), e))
            .collect();
        Ok(Hierarchy {
            config,
            entities,
            embeddables,
        })
    }

    fn entity(&self, name: &str) -> Result<&'c EntityDefinition, MetamodelError> {
        self.entities
            .get(name)
            .copied()
            .ok_or_else(|| MetamodelError::unknown_entity(name))
    }

    fn embeddable(&self, name: &str) -> Result<&'c EmbeddableDefinition, MetamodelError> {
        self.embeddables.get(name).copied().ok_or_else(|| {
            MetamodelError::invalid_config(format!("Unknown embeddable `{}`", name))
        })
    }

    /// Ancestors, nearest first.
    fn ancestors(&self, entity: &EntityDefinition) -> Result<Vec<&'c EntityDefinition>, MetamodelError> {
        let mut ancestors = Vec::new();
        let mut current = entity.extends.as_deref();
        while let Some(name) = current {
            let parent = self.entity(name).map_err(|_| {
                MetamodelError::invalid_config(format!(
                    "Entity `{}` extends unknown entity `{}`",
                    entity.name, name
                ))
            })?;
            if parent.name == entity.name || ancestors.len() >= self.entities.len() {
                return Err(MetamodelError::invalid_config(format!(
                    "Inheritance cycle through entity `{}`",
                    entity.name
                )));
            }
            ancestors.push(parent);
            current = parent.extends.as_deref();
        }
        Ok(ancestors)
    }

    fn root(&self, entity: &'c EntityDefinition) -> Result<&'c EntityDefinition, MetamodelError> {
        Ok(self.ancestors(entity)?.last().copied().unwrap_or(entity))
    }

    fn children(&self, entity: &EntityDefinition) -> impl Iterator<Item = &'c EntityDefinition> + '_ {
        let name = entity.name.clone();
        self.config
            .entities
            .iter()
            .filter(move |e| e.extends.as_deref() == Some(name.as_str()))
    }

    /// Descendants depth-first, in declaration order.
    fn descendants(&self, entity: &EntityDefinition) -> Vec<&'c EntityDefinition> {
        let mut descendants = Vec::new();
        for child in self.children(entity) {
            descendants.push(child);
            descendants.extend(self.descendants(child));
        }
        descendants
    }

    fn strategy(&self, entity: &'c EntityDefinition) -> Result<InheritanceStrategy, MetamodelError> {
        Ok(self.root(entity)?.inheritance.unwrap_or_default())
    }

    /// Primary table followed by secondary tables.
    fn own_tables(&self, entity: &'c EntityDefinition) -> Result<Vec<String>, MetamodelError> {
        let primary = match (&entity.table, self.strategy(entity)?) {
            (Some(table), _) => table.clone(),
            (None, InheritanceStrategy::SingleTable) => {
                self.root(entity)?.table.clone().ok_or_else(|| {
                    MetamodelError::invalid_config(format!(
                        "Single-table hierarchy root of `{}` declares no table",
                        entity.name
                    ))
                })?
            }
            (None, InheritanceStrategy::Joined) => {
                return Err(MetamodelError::invalid_config(format!(
                    "Entity `{}` declares no table",
                    entity.name
                )))
            }
        };
        let mut tables = vec![primary];
        tables.extend(entity.secondary_tables.iter().cloned());
        Ok(tables)
    }

    /// Own tables, then ancestors nearest-first, then descendants depth-first.
    fn table_order(&self, entity: &'c EntityDefinition) -> Result<Vec<String>, MetamodelError> {
        let mut members = vec![entity];
        members.extend(self.ancestors(entity)?);
        members.extend(self.descendants(entity));

        let mut order: Vec<String> = Vec::new();
        for member in members {
            for table in self.own_tables(member)? {
                if !order.contains(&table) {
                    order.push(table);
                }
            }
        }
        Ok(order)
    }

    fn root_identifier(&self, entity: &'c EntityDefinition) -> Result<&'c IdentifierDefinition, MetamodelError> {
        let root = self.root(entity)?;
        root.identifier.as_ref().ok_or_else(|| {
            MetamodelError::invalid_config(format!("Hierarchy root `{}` declares no identifier", root.name))
        })
    }

    /// Identifier columns and SQL type codes as declared on the hierarchy root.
    fn identifier_slots(&self, entity: &'c EntityDefinition) -> Result<(Vec<String>, Vec<i32>), MetamodelError> {
        let id = self.root_identifier(entity)?;
        let context = format!("{}.{}", entity.name, id.name);
        match &id.embeddable {
            Some(embeddable) => {
                let component = self.component_mapping(&context, embeddable, 0)?;
                let mut columns = Vec::new();
                let mut codes = Vec::new();
                for attribute in &component.attributes {
                    for (column, code) in attribute.columns.iter().zip(&attribute.sql_type_codes) {
                        let column = column.clone().ok_or_else(|| {
                            MetamodelError::invalid_config(format!(
                                "Composite identifier `{}` cannot use formulas",
                                context
                            ))
                        })?;
                        columns.push(column);
                        codes.push(*code);
                    }
                }
                if !id.columns.is_empty() {
                    if id.columns.len() != columns.len() {
                        return Err(MetamodelError::invalid_config(format!(
                            "Composite identifier `{}` lists {} column(s) but its embeddable maps {}",
                            context,
                            id.columns.len(),
                            columns.len()
                        )));
                    }
                    columns = id.columns.clone();
                }
                Ok((columns, codes))
            }
            None => {
                let java_type = parse_type(id.type_name.as_deref().unwrap_or("long"), &context)?;
                let columns = if id.columns.is_empty() {
                    vec![id.name.clone()]
                } else {
                    id.columns.clone()
                };
                let codes = vec![java_type.recommended_sql_type(); columns.len()];
                Ok((columns, codes))
            }
        }
    }

    fn identifier_mapping(&self, entity: &'c EntityDefinition) -> Result<IdentifierMapping, MetamodelError> {
        let id = self.root_identifier(entity)?;
        let context = format!("{}.{}", entity.name, id.name);
        let (root_columns, sql_type_codes) = self.identifier_slots(entity)?;
        let columns = match &entity.key_columns {
            Some(key_columns) if entity.extends.is_some() => {
                if key_columns.len() != root_columns.len() {
                    return Err(MetamodelError::invalid_config(format!(
                        "Entity `{}` lists {} key column(s) but its identifier has {}",
                        entity.name,
                        key_columns.len(),
                        root_columns.len()
                    )));
                }
                key_columns.clone()
            }
            _ => root_columns,
        };
        let id_type = match &id.embeddable {
            Some(embeddable) => MappedType::Component(self.component_mapping(&context, embeddable, 0)?),
            None => MappedType::Basic(BasicType::standard(parse_type(
                id.type_name.as_deref().unwrap_or("long"),
                &context,
            )?)),
        };
        Ok(IdentifierMapping {
            name: id.name.clone(),
            columns,
            sql_type_codes,
            id_type,
        })
    }

    fn component_mapping(
        &self,
        context: &str,
        embeddable_name: &str,
        table_number: usize,
    ) -> Result<ComponentMapping, MetamodelError> {
        let embeddable = self.embeddable(embeddable_name)?;
        let mut attributes = Vec::with_capacity(embeddable.attributes.len());
        for definition in &embeddable.attributes {
            attributes.push(self.attribute_mapping(context, definition, table_number, true)?);
        }
        Ok(ComponentMapping {
            embeddable_name: embeddable.name.clone(),
            attributes,
        })
    }

    /// Target identifier SQL types, for foreign keys pointing at `target`.
    fn target_identifier_codes(&self, target: &str) -> Result<Vec<i32>, MetamodelError> {
        let target = self.entity(target)?;
        Ok(self.identifier_slots(target)?.1)
    }

    fn owner_identifier_codes(&self, owner: &str) -> Result<Vec<i32>, MetamodelError> {
        let owner = self.entity(owner)?;
        Ok(self.identifier_slots(owner)?.1)
    }

    fn attribute_mapping(
        &self,
        declaring: &str,
        definition: &AttributeDefinition,
        table_number: usize,
        in_embeddable: bool,
    ) -> Result<AttributeMapping, MetamodelError> {
        let context = format!("{}.{}", declaring, definition.name());
        if in_embeddable && definition.is_plural() {
            return Err(MetamodelError::unsupported(context, "collections nested in embeddables"));
        }

        let mapping = match definition {
            AttributeDefinition::Basic(def) => {
                let basic = basic_type(&def.type_name, def.enum_storage, def.sql_type, def.converter.clone(), &context)?;
                let (columns, formulas) = match &def.formula {
                    Some(formula) => (vec![None], Some(vec![Some(formula.clone())])),
                    None => {
                        let mut names: Vec<String> = def.column.iter().cloned().collect();
                        names.extend(def.columns.iter().cloned());
                        if names.is_empty() {
                            names.push(def.name.clone());
                        }
                        (some_columns(&names), None)
                    }
                };
                AttributeMapping {
                    name: def.name.clone(),
                    table_number,
                    sql_type_codes: vec![basic.sql_type_code; columns.len()],
                    columns,
                    formulas,
                    mapped_type: MappedType::Basic(basic),
                }
            }
            AttributeDefinition::Embedded(def) => {
                let component = self.component_mapping(&context, &def.embeddable, table_number)?;
                let mut columns = Vec::new();
                let mut formulas = Vec::new();
                let mut sql_type_codes = Vec::new();
                for sub in &component.attributes {
                    columns.extend(sub.columns.iter().cloned());
                    match &sub.formulas {
                        Some(sub_formulas) => formulas.extend(sub_formulas.iter().cloned()),
                        None => formulas.extend(std::iter::repeat(None).take(sub.columns.len())),
                    }
                    sql_type_codes.extend(sub.sql_type_codes.iter().copied());
                }
                let formulas = if formulas.iter().any(Option::is_some) {
                    Some(formulas)
                } else {
                    None
                };
                AttributeMapping {
                    name: def.name.clone(),
                    table_number,
                    columns,
                    formulas,
                    sql_type_codes,
                    mapped_type: MappedType::Component(component),
                }
            }
            AttributeDefinition::Any(def) => {
                let any = any_type(&def.discriminator_type, &def.identifier_type, &context)?;
                AttributeMapping {
                    name: def.name.clone(),
                    table_number,
                    columns: vec![
                        Some(def.discriminator_column.clone()),
                        Some(def.identifier_column.clone()),
                    ],
                    formulas: None,
                    sql_type_codes: vec![
                        any.discriminator_type.sql_type_code,
                        any.identifier_type.sql_type_code,
                    ],
                    mapped_type: MappedType::Any(any),
                }
            }
            AttributeDefinition::ManyToOne(def) | AttributeDefinition::OneToOne(def) => {
                let is_one_to_one = matches!(definition, AttributeDefinition::OneToOne(_));
                let kind = match (is_one_to_one, def.primary_key) {
                    (true, true) => AssociationKind::PrimaryKeyOneToOne,
                    (true, false) => AssociationKind::UniqueKeyOneToOne,
                    (false, false) => AssociationKind::ManyToOne,
                    (false, true) => {
                        return Err(MetamodelError::invalid_config(format!(
                            "`{}`: primary_key is only valid on one_to_one",
                            context
                        )))
                    }
                };
                let mut names: Vec<String> = def.column.iter().cloned().collect();
                names.extend(def.columns.iter().cloned());
                if names.is_empty() && kind != AssociationKind::PrimaryKeyOneToOne {
                    names.push(format!("{}_id", def.name));
                }
                let target_codes = self.target_identifier_codes(&def.target)?;
                let sql_type_codes = if names.is_empty() {
                    Vec::new()
                } else if names.len() == target_codes.len() {
                    target_codes
                } else {
                    return Err(MetamodelError::invalid_config(format!(
                        "`{}` maps {} column(s) but `{}` has {} identifier column(s)",
                        context,
                        names.len(),
                        def.target,
                        target_codes.len()
                    )));
                };
                AttributeMapping {
                    name: def.name.clone(),
                    table_number,
                    columns: some_columns(&names),
                    formulas: None,
                    sql_type_codes,
                    mapped_type: MappedType::Association {
                        target_entity: def.target.clone(),
                        kind,
                    },
                }
            }
            AttributeDefinition::OneToMany(def) => {
                self.entity(&def.target)?;
                let collection = CollectionMapping {
                    role: context.clone(),
                    shape: def.shape,
                    collection_table: None,
                    key_columns: def.key_columns.clone(),
                    key_sql_type_codes: self.key_codes(declaring, &def.key_columns, &context)?,
                    element: ElementMapping {
                        element_type: ElementMappedType::Entity {
                            target_entity: def.target.clone(),
                            via_link_table: false,
                        },
                        columns: vec![],
                        formulas: None,
                        sql_type_codes: vec![],
                    },
                    index: self.index_mapping(def.index.as_ref(), &context)?,
                };
                collection_attribute(&def.name, table_number, collection)
            }
            AttributeDefinition::ManyToMany(def) => {
                let element_codes = self.target_identifier_codes(&def.target)?;
                if element_codes.len() != def.element_columns.len() {
                    return Err(MetamodelError::invalid_config(format!(
                        "`{}` maps {} element column(s) but `{}` has {} identifier column(s)",
                        context,
                        def.element_columns.len(),
                        def.target,
                        element_codes.len()
                    )));
                }
                let collection = CollectionMapping {
                    role: context.clone(),
                    shape: def.shape,
                    collection_table: Some(def.collection_table.clone()),
                    key_columns: def.key_columns.clone(),
                    key_sql_type_codes: self.key_codes(declaring, &def.key_columns, &context)?,
                    element: ElementMapping {
                        element_type: ElementMappedType::Entity {
                            target_entity: def.target.clone(),
                            via_link_table: true,
                        },
                        columns: some_columns(&def.element_columns),
                        formulas: None,
                        sql_type_codes: element_codes,
                    },
                    index: self.index_mapping(def.index.as_ref(), &context)?,
                };
                collection_attribute(&def.name, table_number, collection)
            }
            AttributeDefinition::ElementCollection(def) => {
                let element = self.element_mapping(&def.element, &context)?;
                let collection = CollectionMapping {
                    role: context.clone(),
                    shape: def.shape,
                    collection_table: Some(def.collection_table.clone()),
                    key_columns: def.key_columns.clone(),
                    key_sql_type_codes: self.key_codes(declaring, &def.key_columns, &context)?,
                    element,
                    index: self.index_mapping(def.index.as_ref(), &context)?,
                };
                collection_attribute(&def.name, table_number, collection)
            }
        };
        Ok(mapping)
    }

    fn key_codes(&self, owner: &str, key_columns: &[String], context: &str) -> Result<Vec<i32>, MetamodelError> {
        let codes = self.owner_identifier_codes(owner)?;
        if codes.len() != key_columns.len() {
            return Err(MetamodelError::invalid_config(format!(
                "`{}` maps {} key column(s) but the owner has {} identifier column(s)",
                context,
                key_columns.len(),
                codes.len()
            )));
        }
        Ok(codes)
    }

    fn index_mapping(
        &self,
        index: Option<&IndexDefinition>,
        context: &str,
    ) -> Result<Option<IndexMapping>, MetamodelError> {
        let Some(index) = index else {
            return Ok(None);
        };
        let index_type = BasicType::standard(parse_type(&index.type_name, context)?);
        Ok(Some(IndexMapping {
            sql_type_codes: vec![index_type.sql_type_code; index.columns.len()],
            columns: index.columns.clone(),
            index_type: DomainType::Basic(index_type),
        }))
    }

    fn element_mapping(&self, element: &ElementDefinition, context: &str) -> Result<ElementMapping, MetamodelError> {
        match element {
            ElementDefinition::Basic {
                type_name,
                column,
                sql_type,
                enum_storage,
            } => {
                let basic = basic_type(type_name, *enum_storage, *sql_type, None, context)?;
                Ok(ElementMapping {
                    columns: vec![Some(column.clone().unwrap_or_else(|| "element".to_string()))],
                    formulas: None,
                    sql_type_codes: vec![basic.sql_type_code],
                    element_type: ElementMappedType::Basic(basic),
                })
            }
            ElementDefinition::Embeddable { embeddable } => {
                // element collection tables hold the component columns at position 0
                let component = self.component_mapping(context, embeddable, 0)?;
                let mut columns = Vec::new();
                let mut sql_type_codes = Vec::new();
                for sub in &component.attributes {
                    columns.extend(sub.columns.iter().cloned());
                    sql_type_codes.extend(sub.sql_type_codes.iter().copied());
                }
                Ok(ElementMapping {
                    element_type: ElementMappedType::Component(component),
                    columns,
                    formulas: None,
                    sql_type_codes,
                })
            }
            ElementDefinition::Any {
                discriminator_column,
                identifier_column,
                discriminator_type,
                identifier_type,
            } => {
                let any = any_type(discriminator_type, identifier_type, context)?;
                Ok(ElementMapping {
                    columns: vec![Some(discriminator_column.clone()), Some(identifier_column.clone())],
                    formulas: None,
                    sql_type_codes: vec![
                        any.discriminator_type.sql_type_code,
                        any.identifier_type.sql_type_code,
                    ],
                    element_type: ElementMappedType::Any(any),
                })
            }
        }
    }
}

fn collection_attribute(name: &str, table_number: usize, collection: CollectionMapping) -> AttributeMapping {
    AttributeMapping {
        name: name.to_string(),
        table_number,
        columns: vec![],
        formulas: None,
        sql_type_codes: vec![],
        mapped_type: MappedType::Collection(collection),
    }
}
