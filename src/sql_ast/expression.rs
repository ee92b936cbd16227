use serde::{Deserialize, Serialize};

use crate::domain_metamodel::database_model::ColumnExpression;
use crate::domain_metamodel::types::{BasicType, DomainType};
use crate::sqm::{ArithmeticOperator, InstantiationTarget, UnaryOperator};

/// A column or formula qualified by its table's identification variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub identification_variable: String,
    pub expression: ColumnExpression,
    pub sql_type_code: i32,
    #[serde(default)]
    pub expression_type: Option<DomainType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    String(String),
    Character(char),
    Double(f64),
    Integer(i32),
    BigInteger(String),
    BigDecimal(String),
    Float(f32),
    Long(i64),
    Boolean(bool),
    Enum {
        enum_name: String,
        constant_name: String,
        ordinal: u32,
    },
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLiteral {
    pub value: LiteralValue,
    /// `None` only for the untyped null literal
    pub literal_type: Option<BasicType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterBinding {
    Positional(u32),
    Named(String),
}

/// Parameter placeholder; `index` is its slot in the tree's parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JdbcParameter {
    pub index: usize,
    pub binding: ParameterBinding,
    #[serde(default)]
    pub expected_type: Option<DomainType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlExpression {
    ColumnReference(ColumnReference),
    /// Multi-column values (composite identifiers, embeddables, foreign keys)
    Tuple {
        expressions: Vec<SqlExpression>,
        expression_type: Option<DomainType>,
    },
    Literal(QueryLiteral),
    Parameter(JdbcParameter),
    EntityTypeLiteral {
        entity_name: String,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<SqlExpression>,
        expression_type: Option<DomainType>,
    },
    BinaryArithmetic {
        lhs: Box<SqlExpression>,
        operator: ArithmeticOperator,
        rhs: Box<SqlExpression>,
        expression_type: Option<DomainType>,
    },
    Concatenation {
        lhs: Box<SqlExpression>,
        rhs: Box<SqlExpression>,
        expression_type: Option<DomainType>,
    },
    Function {
        name: String,
        arguments: Vec<SqlExpression>,
        result_type: Option<DomainType>,
    },
}

impl SqlExpression {
    pub fn expression_type(&self) -> Option<DomainType> {
        match self {
            SqlExpression::ColumnReference(column) => column.expression_type.clone(),
            SqlExpression::Literal(literal) => literal.literal_type.clone().map(DomainType::Basic),
            SqlExpression::Parameter(parameter) => parameter.expected_type.clone(),
            SqlExpression::EntityTypeLiteral { entity_name } => {
                Some(DomainType::Entity(entity_name.clone()))
            }
            SqlExpression::Tuple { expression_type, .. }
            | SqlExpression::Unary { expression_type, .. }
            | SqlExpression::BinaryArithmetic { expression_type, .. }
            | SqlExpression::Concatenation { expression_type, .. } => expression_type.clone(),
            SqlExpression::Function { result_type, .. } => result_type.clone(),
        }
    }

    /// Single column, or a tuple of them.
    pub fn from_columns(mut columns: Vec<ColumnReference>, expression_type: Option<DomainType>) -> Self {
        if columns.len() == 1 {
            let mut column = columns.remove(0);
            if column.expression_type.is_none() {
                column.expression_type = expression_type;
            }
            SqlExpression::ColumnReference(column)
        } else {
            SqlExpression::Tuple {
                expressions: columns.into_iter().map(SqlExpression::ColumnReference).collect(),
                expression_type,
            }
        }
    }

    /// Column references in order; empty for non-column expressions.
    pub fn column_references(&self) -> Vec<&ColumnReference> {
        match self {
            SqlExpression::ColumnReference(column) => vec![column],
            SqlExpression::Tuple { expressions, .. } => {
                expressions.iter().flat_map(SqlExpression::column_references).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlSelectionKind {
    Expression(SqlExpression),
    DynamicInstantiation {
        target: InstantiationTarget,
        arguments: Vec<SqlSelection>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlSelection {
    pub kind: SqlSelectionKind,
    #[serde(default)]
    pub alias: Option<String>,
}
