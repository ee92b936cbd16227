//! Path Resolver
//!
//! Resolves `alias.a.b` paths against the from-index and the table spaces of
//! the query being lowered, and turns the result into column expressions.
//!
//! A path starts at the group registered for `alias`. Entity groups start at
//! the entity, many-to-many groups at the element entity (shifted by the
//! group's element offset) and embeddable collections at the element
//! embeddable. Intermediate segments may only pass through embedded
//! attributes. The single exception is `alias.association.<identifier>`,
//! which reads the foreign key columns without a join.

use crate::domain_metamodel::attribute::{AttributeDescriptor, ManagedTypeRef, PluralAttribute, SingularAttribute};
use crate::domain_metamodel::classification::{ElementClassification, SingularAttributeClassification};
use crate::domain_metamodel::errors::MetamodelError;
use crate::domain_metamodel::metamodel::DomainMetamodel;
use crate::domain_metamodel::types::DomainType;
use crate::sql_ast::{SqlExpression, SqlPredicate, TableGroup, TableSpace};
use crate::sqm::AttributeReference;

use super::errors::LoweringError;
use super::from_clause_index::{FromIndex, GroupPosition, TableGroupRef, TableGroupSource};
use super::table_group_builder::TableGroupBuilder;

#[derive(Debug, Clone, Copy)]
pub enum PathTarget<'m> {
    Attribute(AttributeDescriptor<'m>),
    /// Target identifier read off the association's foreign key
    ForeignKey {
        association: &'m SingularAttribute,
        identifier: &'m SingularAttribute,
    },
}

#[derive(Debug, Clone)]
pub struct ResolvedPath<'m> {
    pub path: String,
    pub group_ref: TableGroupRef,
    pub target: PathTarget<'m>,
    pub element_offset: usize,
}

pub struct PathResolver<'a, 'm> {
    metamodel: &'m DomainMetamodel,
    from_index: &'a FromIndex,
    spaces: &'a [TableSpace],
}

impl<'a, 'm> PathResolver<'a, 'm> {
    pub fn new(metamodel: &'m DomainMetamodel, from_index: &'a FromIndex, spaces: &'a [TableSpace]) -> Self {
        PathResolver {
            metamodel,
            from_index,
            spaces,
        }
    }

    /// Table group under construction that `group_ref` points at.
    pub fn group(&self, group_ref: &TableGroupRef) -> Result<&'a TableGroup, LoweringError> {
        let space = self.spaces.get(group_ref.locator.space);
        let group = match group_ref.locator.position {
            GroupPosition::Root => space.map(|space| &space.root),
            GroupPosition::Join(index) => space
                .and_then(|space| space.joins.get(index))
                .map(|join| &join.group),
        };
        group.ok_or_else(|| LoweringError::UnexpectedNode {
            expected: "registered table group",
            found: "dangling from-index entry",
        })
    }

    pub fn resolve(&self, reference: &AttributeReference) -> Result<ResolvedPath<'m>, LoweringError> {
        let path = reference.dotted();
        let group_ref = self.from_index.resolve(&reference.lhs_alias)?.clone();
        let (mut scope, element_offset) = self.scope(&group_ref, &path)?;

        let mut segments = reference.path.iter().peekable();
        while let Some(name) = segments.next() {
            let attribute = self.metamodel.resolve_attribute(&scope, name)?;
            let Some(next) = segments.peek().copied() else {
                log::trace!("PathResolver: '{}' -> {}", path, attribute.name());
                return Ok(ResolvedPath {
                    path,
                    group_ref,
                    target: PathTarget::Attribute(attribute),
                    element_offset,
                });
            };

            let singular = match attribute {
                AttributeDescriptor::Plural(plural) => {
                    return Err(LoweringError::invalid_path(
                        path,
                        format!("collection `{}` must be joined before it is dereferenced", plural.role),
                    ))
                }
                AttributeDescriptor::Singular(singular) => singular,
            };

            match singular.classification {
                SingularAttributeClassification::Embedded => {
                    scope = match &singular.attribute_type {
                        DomainType::Embeddable(role) => ManagedTypeRef::Embeddable(role.clone()),
                        other => {
                            return Err(MetamodelError::malformed(
                                singular.role(),
                                format!("embedded attribute typed as {}", other.type_name()),
                            )
                            .into())
                        }
                    };
                }
                SingularAttributeClassification::ManyToOne | SingularAttributeClassification::OneToOne => {
                    if segments.len() == 1 {
                        let target = self.metamodel.resolve_entity_type(&entity_name(singular)?)?;
                        if let Some(AttributeDescriptor::Singular(identifier)) = target.find_attribute(next) {
                            if identifier.is_identifier {
                                return Ok(ResolvedPath {
                                    path,
                                    group_ref,
                                    target: PathTarget::ForeignKey {
                                        association: singular,
                                        identifier,
                                    },
                                    element_offset,
                                });
                            }
                        }
                    }
                    return Err(LoweringError::invalid_path(
                        path,
                        format!("association `{}` must be joined before it is dereferenced", singular.role()),
                    ));
                }
                SingularAttributeClassification::Any => {
                    return Err(MetamodelError::unsupported(
                        singular.role(),
                        "ANY-typed attributes cannot be dereferenced",
                    )
                    .into())
                }
                SingularAttributeClassification::Basic => {
                    return Err(LoweringError::invalid_path(
                        path,
                        format!("basic attribute `{}` has no attributes", singular.role()),
                    ))
                }
            }
        }

        Err(LoweringError::invalid_path(path, "path names no attribute"))
    }

    /// Columns of a resolved singular path, in column order.
    pub fn singular_expression(&self, resolved: &ResolvedPath<'m>) -> Result<SqlExpression, LoweringError> {
        let group = self.group(&resolved.group_ref)?;
        let builder = TableGroupBuilder::new(self.metamodel);
        match resolved.target {
            PathTarget::Attribute(AttributeDescriptor::Plural(plural)) => Err(LoweringError::invalid_path(
                resolved.path.as_str(),
                format!("collection `{}` must be joined before it is referenced", plural.role),
            )),
            PathTarget::Attribute(AttributeDescriptor::Singular(singular)) => {
                if singular.classification == SingularAttributeClassification::Any {
                    return Err(MetamodelError::unsupported(
                        singular.role(),
                        "ANY-typed attributes cannot be lowered",
                    )
                    .into());
                }
                builder.columns_at(
                    group,
                    singular.table_position + resolved.element_offset,
                    &singular.columns,
                    Some(singular.attribute_type.clone()),
                )
            }
            PathTarget::ForeignKey {
                association,
                identifier,
            } => builder.columns_at(
                group,
                association.table_position + resolved.element_offset,
                &association.columns,
                Some(identifier.attribute_type.clone()),
            ),
        }
    }

    /// Value of the from-element itself: the entity identifier for entity
    /// groups, the element for collection groups.
    pub fn from_element_expression(&self, group_ref: &TableGroupRef) -> Result<SqlExpression, LoweringError> {
        let group = self.group(group_ref)?;
        match &group_ref.source {
            TableGroupSource::Entity(name) => {
                let entity = self.metamodel.resolve_entity_type(name)?;
                TableGroupBuilder::new(self.metamodel).columns_at(
                    group,
                    0,
                    &entity.identifier.columns,
                    Some(DomainType::Entity(entity.name.clone())),
                )
            }
            TableGroupSource::Collection(role) => {
                let plural = self.metamodel.resolve_collection(role)?;
                element_expression(self.metamodel, plural, group)
            }
        }
    }

    fn scope(&self, group_ref: &TableGroupRef, path: &str) -> Result<(ManagedTypeRef, usize), LoweringError> {
        match &group_ref.source {
            TableGroupSource::Entity(name) => Ok((ManagedTypeRef::Entity(name.clone()), 0)),
            TableGroupSource::Collection(role) => {
                let plural = self.metamodel.resolve_collection(role)?;
                match (plural.element.classification, &plural.element.element_type) {
                    (ElementClassification::ManyToMany, DomainType::Entity(name)) => {
                        let group = self.group(group_ref)?;
                        Ok((ManagedTypeRef::Entity(name.clone()), group.element_offset))
                    }
                    (ElementClassification::OneToMany, DomainType::Entity(name)) => {
                        Ok((ManagedTypeRef::Entity(name.clone()), 0))
                    }
                    (ElementClassification::Embeddable, DomainType::Embeddable(element_role)) => {
                        Ok((ManagedTypeRef::Embeddable(element_role.clone()), 0))
                    }
                    (ElementClassification::Any, _) => Err(MetamodelError::unsupported(
                        role,
                        "ANY-typed collection elements cannot be dereferenced",
                    )
                    .into()),
                    _ => Err(LoweringError::invalid_path(
                        path,
                        format!("elements of `{}` have no attributes", role),
                    )),
                }
            }
        }
    }
}

/// Element value of a collection group.
///
/// Entity-valued collections yield the element identifier, read from the
/// element entity's primary table. Basic and embeddable collections yield
/// the element columns of the collection table.
pub fn element_expression(
    metamodel: &DomainMetamodel,
    plural: &PluralAttribute,
    group: &TableGroup,
) -> Result<SqlExpression, LoweringError> {
    let builder = TableGroupBuilder::new(metamodel);
    match plural.element.classification {
        ElementClassification::ManyToMany | ElementClassification::OneToMany => {
            let element_name = plural.element_entity().ok_or_else(|| {
                MetamodelError::malformed(&plural.role, "entity-valued collection without an element entity")
            })?;
            let element = metamodel.resolve_entity_type(element_name)?;
            builder.columns_at(
                group,
                group.element_offset,
                &element.identifier.columns,
                Some(DomainType::Entity(element.name.clone())),
            )
        }
        ElementClassification::Basic | ElementClassification::Embeddable => builder.columns_at(
            group,
            0,
            &plural.element.columns,
            Some(plural.element.element_type.clone()),
        ),
        ElementClassification::Any => Err(MetamodelError::unsupported(
            &plural.role,
            "ANY-typed collection elements cannot be lowered",
        )
        .into()),
    }
}

/// "key columns = owner identifier" for a collection group.
pub fn collection_key_predicate(
    metamodel: &DomainMetamodel,
    plural: &PluralAttribute,
    group: &TableGroup,
    owner_identifier: SqlExpression,
) -> Result<Option<SqlPredicate>, LoweringError> {
    let key = TableGroupBuilder::new(metamodel).located_column_references(group, &plural.key_columns)?;
    let key = SqlExpression::from_columns(key, None);
    column_equality(&plural.role, key, owner_identifier)
}

/// Pairwise equality of two column lists of the same width.
pub fn column_equality(
    role: &str,
    lhs: SqlExpression,
    rhs: SqlExpression,
) -> Result<Option<SqlPredicate>, LoweringError> {
    let lhs = column_list(lhs);
    let rhs = column_list(rhs);
    if lhs.len() != rhs.len() {
        return Err(MetamodelError::malformed(
            role,
            format!("{} column(s) cannot be matched against {} column(s)", lhs.len(), rhs.len()),
        )
        .into());
    }
    Ok(SqlPredicate::column_equality(lhs, rhs))
}

/// The members of a tuple, or the expression alone.
pub fn column_list(expression: SqlExpression) -> Vec<SqlExpression> {
    match expression {
        SqlExpression::Tuple { expressions, .. } => expressions,
        other => vec![other],
    }
}

pub fn entity_name(association: &SingularAttribute) -> Result<String, LoweringError> {
    match &association.attribute_type {
        DomainType::Entity(name) => Ok(name.clone()),
        other => Err(MetamodelError::malformed(
            association.role(),
            format!("association typed as {}", other.type_name()),
        )
        .into()),
    }
}
