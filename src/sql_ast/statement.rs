use serde::{Deserialize, Serialize};

use super::expression::{JdbcParameter, SqlExpression, SqlSelection};
use super::from_clause::{FromClause, TableGroup};
use super::predicate::SqlPredicate;
use crate::lowering::from_clause_index::{GroupPosition, TableGroupRef};
use crate::sqm::SortOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlSortSpecification {
    pub expression: SqlExpression,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub distinct: bool,
    pub selections: Vec<SqlSelection>,
    pub from_clause: FromClause,
    #[serde(default)]
    pub where_predicate: Option<SqlPredicate>,
    #[serde(default)]
    pub sort_specifications: Vec<SqlSortSpecification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub query_spec: QuerySpec,
    pub parameters: Vec<JdbcParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlAssignment {
    pub columns: Vec<SqlExpression>,
    pub value: SqlExpression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuery {
    /// Single space holding the target's table group
    pub from_clause: FromClause,
    pub assignments: Vec<SqlAssignment>,
    #[serde(default)]
    pub where_predicate: Option<SqlPredicate>,
    pub parameters: Vec<JdbcParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    pub from_clause: FromClause,
    #[serde(default)]
    pub where_predicate: Option<SqlPredicate>,
    pub parameters: Vec<JdbcParameter>,
}

/// Output of one lowering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlAstTree {
    Select(SelectQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

impl SqlAstTree {
    pub fn from_clause(&self) -> &FromClause {
        match self {
            SqlAstTree::Select(select) => &select.query_spec.from_clause,
            SqlAstTree::Update(update) => &update.from_clause,
            SqlAstTree::Delete(delete) => &delete.from_clause,
        }
    }

    /// Parameters in encounter order.
    pub fn parameters(&self) -> &[JdbcParameter] {
        match self {
            SqlAstTree::Select(select) => &select.parameters,
            SqlAstTree::Update(update) => &update.parameters,
            SqlAstTree::Delete(delete) => &delete.parameters,
        }
    }

    pub fn find_table_group(&self, group_ref: &TableGroupRef) -> Option<&TableGroup> {
        let space = self.from_clause().spaces.get(group_ref.locator.space)?;
        match group_ref.locator.position {
            GroupPosition::Root => Some(&space.root),
            GroupPosition::Join(index) => space.joins.get(index).map(|join| &join.group),
        }
    }
}
