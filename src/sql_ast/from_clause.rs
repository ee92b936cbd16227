use serde::{Deserialize, Serialize};

use super::predicate::SqlPredicate;
use crate::domain_metamodel::database_model::{TableId, TableReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlJoinType {
    Inner,
    Left,
}

/// One physical or derived table under a table group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub table_id: TableId,
    pub reference: TableReference,
    /// `<alias base>_<position>`
    pub identification_variable: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableJoin {
    pub join_type: SqlJoinType,
    pub table: Table,
    #[serde(default)]
    pub predicate: Option<SqlPredicate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableGroupKind {
    Entity { entity_name: String },
    Collection { role: String },
}

/// The tables backing one logical reference: a root table plus ordered joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGroup {
    pub alias_base: String,
    pub kind: TableGroupKind,
    pub root_table: Table,
    pub table_joins: Vec<TableJoin>,
    /// Position of the element entity's primary table (many-to-many groups)
    #[serde(default)]
    pub element_offset: usize,
}

impl TableGroup {
    pub fn table_count(&self) -> usize {
        1 + self.table_joins.len()
    }

    /// Table at `position`; 0 is the root table.
    pub fn table_at(&self, position: usize) -> Option<&Table> {
        match position {
            0 => Some(&self.root_table),
            n => self.table_joins.get(n - 1).map(|join| &join.table),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        std::iter::once(&self.root_table).chain(self.table_joins.iter().map(|join| &join.table))
    }

    /// Position of the first table with `table_id`.
    pub fn position_of(&self, table_id: TableId) -> Option<usize> {
        self.tables().position(|table| table.table_id == table_id)
    }

    pub fn identification_variables(&self) -> Vec<&str> {
        self.tables()
            .map(|table| table.identification_variable.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGroupJoin {
    pub join_type: SqlJoinType,
    pub group: TableGroup,
    #[serde(default)]
    pub predicate: Option<SqlPredicate>,
    #[serde(default)]
    pub fetched: bool,
}

/// One root table group with the groups joined onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpace {
    pub root: TableGroup,
    #[serde(default)]
    pub joins: Vec<TableGroupJoin>,
}

impl TableSpace {
    pub fn new(root: TableGroup) -> Self {
        TableSpace {
            root,
            joins: Vec::new(),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &TableGroup> {
        std::iter::once(&self.root).chain(self.joins.iter().map(|join| &join.group))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub spaces: Vec<TableSpace>,
}

impl FromClause {
    pub fn groups(&self) -> impl Iterator<Item = &TableGroup> {
        self.spaces.iter().flat_map(TableSpace::groups)
    }
}
