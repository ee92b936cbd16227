//! Lowered SQL AST: table groups bound to physical tables, plus the clauses,
//! expressions and predicates of the statement.

pub mod expression;
pub mod from_clause;
pub mod predicate;
pub mod statement;

pub use expression::{
    ColumnReference, JdbcParameter, LiteralValue, ParameterBinding, QueryLiteral, SqlExpression,
    SqlSelection, SqlSelectionKind,
};
pub use from_clause::{
    FromClause, SqlJoinType, Table, TableGroup, TableGroupJoin, TableGroupKind, TableJoin,
    TableSpace,
};
pub use predicate::{JunctionKind, SqlPredicate};
pub use statement::{
    DeleteQuery, QuerySpec, SelectQuery, SqlAssignment, SqlAstTree, SqlSortSpecification,
    UpdateQuery,
};
