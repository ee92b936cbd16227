//! Physical/derived tables and the columns or formulas they own.
//!
//! Attributes never own columns. They hold [`ColumnId`]s pointing into the
//! table that owns the slot.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::MetamodelError;

lazy_static! {
    static ref DERIVED_TABLE_PATTERN: Regex =
        Regex::new(r"(?i)^\s*select\b").expect("derived table pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableReference {
    Physical { table_name: String },
    /// Subselect used in place of a table
    Derived { expression: String },
}

impl TableReference {
    pub fn table_expression(&self) -> &str {
        match self {
            TableReference::Physical { table_name } => table_name,
            TableReference::Derived { expression } => expression,
        }
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, TableReference::Physical { .. })
    }
}

/// One column/formula slot owned by a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnExpression {
    Column(String),
    Formula(String),
}

impl ColumnExpression {
    pub fn text(&self) -> &str {
        match self {
            ColumnExpression::Column(name) => name,
            ColumnExpression::Formula(formula) => formula,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub expression: ColumnExpression,
    pub sql_type_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub reference: TableReference,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseModel {
    tables: Vec<TableSpec>,
    physical_by_name: HashMap<String, TableId>,
}

impl DatabaseModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a table expression to a table, creating it when first seen.
    ///
    /// Expressions starting with `select` become derived tables (never shared);
    /// anything else is a physical table found by name.
    pub fn table_for_expression(&mut self, table_expression: &str) -> TableId {
        if DERIVED_TABLE_PATTERN.is_match(table_expression) {
            self.create_derived_table(table_expression)
        } else {
            self.find_or_create_physical_table(table_expression.trim())
        }
    }

    pub fn find_or_create_physical_table(&mut self, table_name: &str) -> TableId {
        if let Some(id) = self.physical_by_name.get(table_name) {
            return *id;
        }
        let id = self.push(TableReference::Physical {
            table_name: table_name.to_string(),
        });
        self.physical_by_name.insert(table_name.to_string(), id);
        id
    }

    pub fn create_derived_table(&mut self, expression: &str) -> TableId {
        self.push(TableReference::Derived {
            expression: expression.trim().to_string(),
        })
    }

    fn push(&mut self, reference: TableReference) -> TableId {
        let id = TableId(self.tables.len());
        log::trace!("DatabaseModel: registering table {:?} as {:?}", reference, id);
        self.tables.push(TableSpec {
            reference,
            columns: Vec::new(),
        });
        id
    }

    pub fn table(&self, id: TableId) -> Option<&TableSpec> {
        self.tables.get(id.0)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.tables.get(id.table.0)?.columns.get(id.index)
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Find or create the slot for `expression` on `table`.
    fn make_slot(&mut self, table: TableId, expression: ColumnExpression, sql_type_code: i32) -> ColumnId {
        let spec = &mut self.tables[table.0];
        if let Some(index) = spec
            .columns
            .iter()
            .position(|c| c.expression == expression && c.sql_type_code == sql_type_code)
        {
            return ColumnId { table, index };
        }
        spec.columns.push(Column {
            expression,
            sql_type_code,
        });
        ColumnId {
            table,
            index: spec.columns.len() - 1,
        }
    }

    pub fn make_column(&mut self, table: TableId, name: &str, sql_type_code: i32) -> ColumnId {
        self.make_slot(table, ColumnExpression::Column(name.to_string()), sql_type_code)
    }

    pub fn make_formula(&mut self, table: TableId, formula: &str, sql_type_code: i32) -> ColumnId {
        self.make_slot(table, ColumnExpression::Formula(formula.to_string()), sql_type_code)
    }

    /// Build the ordered column/formula slots backing one attribute.
    ///
    /// The three inputs must have the same length and each slot must have
    /// exactly one of column or formula set.
    pub fn make_values(
        &mut self,
        role: &str,
        table: TableId,
        columns: &[Option<String>],
        formulas: Option<&[Option<String>]>,
        sql_type_codes: &[i32],
    ) -> Result<Vec<ColumnId>, MetamodelError> {
        if self.table(table).is_none() {
            return Err(MetamodelError::malformed(
                role,
                format!("containing table {:?} is not registered", table),
            ));
        }
        if columns.len() != sql_type_codes.len() {
            return Err(MetamodelError::malformed(
                role,
                format!(
                    "{} column slot(s) but {} SQL type code(s)",
                    columns.len(),
                    sql_type_codes.len()
                ),
            ));
        }
        if let Some(formulas) = formulas {
            if formulas.len() != columns.len() {
                return Err(MetamodelError::malformed(
                    role,
                    format!(
                        "{} column slot(s) but {} formula slot(s)",
                        columns.len(),
                        formulas.len()
                    ),
                ));
            }
        }

        let mut values = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let formula = formulas.and_then(|f| f[i].as_ref());
            let sql_type_code = sql_type_codes[i];
            let value = match (column, formula) {
                (Some(column), None) => self.make_column(table, column, sql_type_code),
                (None, Some(formula)) => self.make_formula(table, formula, sql_type_code),
                (Some(_), Some(_)) => {
                    return Err(MetamodelError::malformed(
                        role,
                        format!("slot {} has both a column and a formula", i),
                    ))
                }
                (None, None) => {
                    return Err(MetamodelError::malformed(
                        role,
                        format!("slot {} has neither a column nor a formula", i),
                    ))
                }
            };
            values.push(value);
        }
        Ok(values)
    }
}
