use serde::{Deserialize, Serialize};

use super::expression::SqlExpression;
use super::statement::QuerySpec;
use crate::sqm::RelationalOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionKind {
    Conjunction,
    Disjunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlPredicate {
    Junction {
        kind: JunctionKind,
        predicates: Vec<SqlPredicate>,
    },
    Grouped(Box<SqlPredicate>),
    Negated(Box<SqlPredicate>),
    Comparison {
        lhs: SqlExpression,
        operator: RelationalOperator,
        rhs: SqlExpression,
    },
    Between {
        expression: SqlExpression,
        lower_bound: SqlExpression,
        upper_bound: SqlExpression,
        negated: bool,
    },
    Like {
        match_expression: SqlExpression,
        pattern: SqlExpression,
        escape_character: Option<SqlExpression>,
        negated: bool,
    },
    Nullness {
        expression: SqlExpression,
        negated: bool,
    },
    Exists {
        subquery: Box<QuerySpec>,
        negated: bool,
    },
    InSubquery {
        expression: SqlExpression,
        subquery: Box<QuerySpec>,
        negated: bool,
    },
}

impl SqlPredicate {
    /// Conjunction of `predicates` in order; `None` when empty.
    pub fn conjunction(mut predicates: Vec<SqlPredicate>) -> Option<SqlPredicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(SqlPredicate::Junction {
                kind: JunctionKind::Conjunction,
                predicates,
            }),
        }
    }

    /// Pairwise `lhs[i] = rhs[i]`, combined with AND.
    pub fn column_equality(lhs: Vec<SqlExpression>, rhs: Vec<SqlExpression>) -> Option<SqlPredicate> {
        let comparisons = lhs
            .into_iter()
            .zip(rhs)
            .map(|(lhs, rhs)| SqlPredicate::Comparison {
                lhs,
                operator: RelationalOperator::Equal,
                rhs,
            })
            .collect();
        Self::conjunction(comparisons)
    }
}
