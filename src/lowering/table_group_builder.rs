//! Expands one entity or collection reference into its table group.
//!
//! An entity's group wraps its backing tables in metamodel order: table 0 is
//! the root (`<base>_0`), tables 1..N are LEFT joins (`<base>_1` ...
//! `<base>_N`) without a predicate. Every backing table is always included,
//! whether or not the query touches subclass state.

use crate::domain_metamodel::attribute::PluralAttribute;
use crate::domain_metamodel::classification::ElementClassification;
use crate::domain_metamodel::database_model::{ColumnId, TableId};
use crate::domain_metamodel::entity::EntityDescriptor;
use crate::domain_metamodel::errors::MetamodelError;
use crate::domain_metamodel::metamodel::DomainMetamodel;
use crate::domain_metamodel::types::DomainType;
use crate::sql_ast::{
    ColumnReference, SqlExpression, SqlJoinType, SqlPredicate, Table, TableGroup, TableGroupKind,
    TableJoin,
};

use super::errors::LoweringError;

pub struct TableGroupBuilder<'m> {
    metamodel: &'m DomainMetamodel,
}

impl<'m> TableGroupBuilder<'m> {
    pub fn new(metamodel: &'m DomainMetamodel) -> Self {
        TableGroupBuilder { metamodel }
    }

    pub fn build_entity_group(
        &self,
        entity: &EntityDescriptor,
        alias_base: &str,
    ) -> Result<TableGroup, LoweringError> {
        let root_table = self.table(entity.primary_table(), alias_base, 0)?;
        let mut table_joins = Vec::with_capacity(entity.tables.len().saturating_sub(1));
        for (position, table_id) in entity.tables.iter().enumerate().skip(1) {
            table_joins.push(TableJoin {
                join_type: SqlJoinType::Left,
                table: self.table(*table_id, alias_base, position)?,
                predicate: None,
            });
        }

        log::debug!(
            "TableGroupBuilder: entity '{}' as '{}' over {} table(s)",
            entity.name,
            alias_base,
            1 + table_joins.len()
        );

        Ok(TableGroup {
            alias_base: alias_base.to_string(),
            kind: TableGroupKind::Entity {
                entity_name: entity.name.clone(),
            },
            root_table,
            table_joins,
            element_offset: 0,
        })
    }

    /// Group for the storage of a plural attribute.
    ///
    /// One-to-many collections have no table of their own and produce the
    /// element entity's group. Many-to-many groups root at the link table and
    /// continue with the element entity's tables. Basic and embeddable element
    /// collections are the collection table alone.
    pub fn build_collection_group(
        &self,
        plural: &PluralAttribute,
        alias_base: &str,
    ) -> Result<TableGroup, LoweringError> {
        match plural.element.classification {
            ElementClassification::OneToMany => {
                let element = self.element_entity(plural)?;
                self.build_entity_group(element, alias_base)
            }
            ElementClassification::ManyToMany => {
                let link_table = self.collection_table(plural)?;
                let element = self.element_entity(plural)?;
                let root_table = self.table(link_table, alias_base, 0)?;

                let mut table_joins = Vec::with_capacity(element.tables.len());
                for (index, table_id) in element.tables.iter().enumerate() {
                    let position = index + 1;
                    let table = self.table(*table_id, alias_base, position)?;
                    let (join_type, predicate) = if index == 0 {
                        let element_columns =
                            self.column_expressions(&plural.element.columns, &root_table.identification_variable)?;
                        let element_ids = self.column_expressions(
                            &element.identifier.columns,
                            &table.identification_variable,
                        )?;
                        (
                            SqlJoinType::Inner,
                            SqlPredicate::column_equality(element_columns, element_ids),
                        )
                    } else {
                        (SqlJoinType::Left, None)
                    };
                    table_joins.push(TableJoin {
                        join_type,
                        table,
                        predicate,
                    });
                }

                log::debug!(
                    "TableGroupBuilder: many-to-many '{}' as '{}' with {} element table(s)",
                    plural.role,
                    alias_base,
                    element.tables.len()
                );

                Ok(TableGroup {
                    alias_base: alias_base.to_string(),
                    kind: TableGroupKind::Collection {
                        role: plural.role.clone(),
                    },
                    root_table,
                    table_joins,
                    element_offset: 1,
                })
            }
            ElementClassification::Basic | ElementClassification::Embeddable => {
                let collection_table = self.collection_table(plural)?;
                log::debug!(
                    "TableGroupBuilder: element collection '{}' as '{}'",
                    plural.role,
                    alias_base
                );
                Ok(TableGroup {
                    alias_base: alias_base.to_string(),
                    kind: TableGroupKind::Collection {
                        role: plural.role.clone(),
                    },
                    root_table: self.table(collection_table, alias_base, 0)?,
                    table_joins: Vec::new(),
                    element_offset: 0,
                })
            }
            ElementClassification::Any => Err(MetamodelError::unsupported(
                &plural.role,
                "collections of ANY elements",
            )
            .into()),
        }
    }

    fn element_entity(&self, plural: &PluralAttribute) -> Result<&'m EntityDescriptor, LoweringError> {
        let name = plural.element_entity().ok_or_else(|| {
            MetamodelError::malformed(&plural.role, "entity-valued collection without an element entity")
        })?;
        Ok(self.metamodel.resolve_entity_type(name)?)
    }

    fn collection_table(&self, plural: &PluralAttribute) -> Result<TableId, LoweringError> {
        plural.collection_table.ok_or_else(|| {
            MetamodelError::malformed(&plural.role, "collection has no collection table").into()
        })
    }

    fn table(&self, table_id: TableId, alias_base: &str, position: usize) -> Result<Table, LoweringError> {
        let spec = self.metamodel.database().table(table_id).ok_or_else(|| {
            MetamodelError::invalid_config(format!("table {:?} is not registered", table_id))
        })?;
        Ok(Table {
            table_id,
            reference: spec.reference.clone(),
            identification_variable: format!("{}_{}", alias_base, position),
        })
    }

    /// Column references for `columns`, all qualified by `identification_variable`.
    pub fn column_references(
        &self,
        columns: &[ColumnId],
        identification_variable: &str,
    ) -> Result<Vec<ColumnReference>, LoweringError> {
        columns
            .iter()
            .map(|id| {
                let column = self.metamodel.database().column(*id).ok_or_else(|| {
                    MetamodelError::invalid_config(format!("column {:?} is not registered", id))
                })?;
                Ok(ColumnReference {
                    identification_variable: identification_variable.to_string(),
                    expression: column.expression.clone(),
                    sql_type_code: column.sql_type_code,
                    expression_type: None,
                })
            })
            .collect()
    }

    fn column_expressions(
        &self,
        columns: &[ColumnId],
        identification_variable: &str,
    ) -> Result<Vec<SqlExpression>, LoweringError> {
        Ok(self
            .column_references(columns, identification_variable)?
            .into_iter()
            .map(SqlExpression::ColumnReference)
            .collect())
    }

    /// Column references for `columns`, each qualified by the group table
    /// that owns it.
    pub fn located_column_references(
        &self,
        group: &TableGroup,
        columns: &[ColumnId],
    ) -> Result<Vec<ColumnReference>, LoweringError> {
        let mut references = Vec::with_capacity(columns.len());
        for id in columns {
            let table = group
                .position_of(id.table)
                .and_then(|position| group.table_at(position))
                .ok_or_else(|| {
                    MetamodelError::invalid_config(format!(
                        "column {:?} does not belong to any table of group '{}'",
                        id, group.alias_base
                    ))
                })?;
            references.extend(self.column_references(&[*id], &table.identification_variable)?);
        }
        Ok(references)
    }

    /// Expression over `columns` of the table at `position` in `group`.
    pub fn columns_at(
        &self,
        group: &TableGroup,
        position: usize,
        columns: &[ColumnId],
        expression_type: Option<DomainType>,
    ) -> Result<SqlExpression, LoweringError> {
        let table = group.table_at(position).ok_or_else(|| {
            MetamodelError::invalid_config(format!(
                "group '{}' has no table at position {}",
                group.alias_base, position
            ))
        })?;
        let references = self.column_references(columns, &table.identification_variable)?;
        Ok(SqlExpression::from_columns(references, expression_type))
    }
}
