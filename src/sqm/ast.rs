//! SQM node set.
//!
//! Nodes are plain data, built once by a parser (or deserialized from JSON)
//! and never mutated afterwards. Every node dispatches to exactly one
//! [`SemanticQueryVisitor`] method through [`SqmNode::accept`].

use serde::{Deserialize, Serialize};

use super::visitor::SemanticQueryVisitor;
use crate::domain_metamodel::types::{DomainType, EnumStorage};

/// A node that can be handed to a [`SemanticQueryVisitor`].
pub trait SqmNode {
    fn accept<V: SemanticQueryVisitor>(&self, visitor: &mut V) -> V::Output;
}

macro_rules! impl_sqm_node {
    ($($node:ty => $method:ident),* $(,)?) => {
        $(
            impl SqmNode for $node {
                fn accept<V: SemanticQueryVisitor>(&self, visitor: &mut V) -> V::Output {
                    visitor.$method(self)
                }
            }
        )*
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqmStatement {
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

impl SqmNode for SqmStatement {
    fn accept<V: SemanticQueryVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            SqmStatement::Select(select) => select.accept(visitor),
            SqmStatement::Update(update) => update.accept(visitor),
            SqmStatement::Delete(delete) => delete.accept(visitor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub query_spec: QuerySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub target: RootEntityFromElement,
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: AttributeReference,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub target: RootEntityFromElement,
    #[serde(default)]
    pub where_clause: Option<WhereClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub from_clause: FromClause,
    /// When absent, the first root's identifier is selected
    #[serde(default)]
    pub select_clause: Option<SelectClause>,
    #[serde(default)]
    pub where_clause: Option<WhereClause>,
    #[serde(default)]
    pub order_by_clause: Option<OrderByClause>,
}

impl QuerySpec {
    pub fn new(from_clause: FromClause) -> Self {
        QuerySpec {
            from_clause,
            select_clause: None,
            where_clause: None,
            order_by_clause: None,
        }
    }

    pub fn with_select(mut self, select_clause: SelectClause) -> Self {
        self.select_clause = Some(select_clause);
        self
    }

    pub fn with_where(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(WhereClause { predicate });
        self
    }

    pub fn with_order_by(mut self, sort_specifications: Vec<SortSpecification>) -> Self {
        self.order_by_clause = Some(OrderByClause { sort_specifications });
        self
    }
}

/// Ordered from-element spaces; order drives alias numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub spaces: Vec<FromElementSpace>,
}

impl FromClause {
    pub fn new(spaces: Vec<FromElementSpace>) -> Self {
        FromClause { spaces }
    }

    pub fn single(root: RootEntityFromElement) -> Self {
        FromClause {
            spaces: vec![FromElementSpace::new(root)],
        }
    }

    /// Index of the space containing the from-element with `alias`.
    pub fn containing_space(&self, alias: &str) -> Option<usize> {
        self.spaces.iter().position(|space| {
            space.root.alias.as_deref() == Some(alias)
                || space.joins.iter().any(|j| j.alias.as_deref() == Some(alias))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromElementSpace {
    pub root: RootEntityFromElement,
    #[serde(default)]
    pub joins: Vec<JoinedFromElement>,
}

impl FromElementSpace {
    pub fn new(root: RootEntityFromElement) -> Self {
        FromElementSpace {
            root,
            joins: Vec::new(),
        }
    }

    pub fn with_join(mut self, join: JoinedFromElement) -> Self {
        self.joins.push(join);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootEntityFromElement {
    pub entity_name: String,
    /// Explicit alias; a unique one is synthesized when absent
    #[serde(default)]
    pub alias: Option<String>,
}

impl RootEntityFromElement {
    pub fn new(entity_name: impl Into<String>, alias: impl Into<String>) -> Self {
        RootEntityFromElement {
            entity_name: entity_name.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn unaliased(entity_name: impl Into<String>) -> Self {
        RootEntityFromElement {
            entity_name: entity_name.into(),
            alias: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqmJoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinSource {
    /// `join p.orders o`; `attribute` may be a dotted path through embeddables
    Attribute { lhs_alias: String, attribute: String },
    /// `join Order o on ...`
    Entity { entity_name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedFromElement {
    #[serde(default)]
    pub alias: Option<String>,
    pub join_type: SqmJoinType,
    pub source: JoinSource,
    #[serde(default)]
    pub fetch: bool,
    #[serde(default)]
    pub on: Option<Predicate>,
}

impl JoinedFromElement {
    pub fn attribute(
        join_type: SqmJoinType,
        lhs_alias: impl Into<String>,
        attribute: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        JoinedFromElement {
            alias: Some(alias.into()),
            join_type,
            source: JoinSource::Attribute {
                lhs_alias: lhs_alias.into(),
                attribute: attribute.into(),
            },
            fetch: false,
            on: None,
        }
    }

    pub fn entity(join_type: SqmJoinType, entity_name: impl Into<String>, alias: impl Into<String>) -> Self {
        JoinedFromElement {
            alias: Some(alias.into()),
            join_type,
            source: JoinSource::Entity {
                entity_name: entity_name.into(),
            },
            fetch: false,
            on: None,
        }
    }

    pub fn with_on(mut self, predicate: Predicate) -> Self {
        self.on = Some(predicate);
        self
    }

    pub fn fetched(mut self) -> Self {
        self.fetch = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectClause {
    #[serde(default)]
    pub distinct: bool,
    pub list: SelectList,
}

impl SelectClause {
    pub fn of(expressions: Vec<Expression>) -> Self {
        SelectClause {
            distinct: false,
            list: SelectList {
                items: expressions
                    .into_iter()
                    .map(|expression| SelectListItem {
                        selection: Selection::Expression(expression),
                        alias: None,
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectList {
    pub items: Vec<SelectListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectListItem {
    pub selection: Selection,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Expression(Expression),
    DynamicInstantiation(DynamicInstantiation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstantiationTarget {
    /// `select new com.acme.Dto(...)`
    Class(String),
    List,
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicInstantiation {
    pub target: InstantiationTarget,
    pub arguments: Vec<SelectListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByClause {
    pub sort_specifications: Vec<SortSpecification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpecification {
    pub expression: Expression,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Grouped(GroupedPredicate),
    And(AndPredicate),
    Or(OrPredicate),
    Negated(NegatedPredicate),
    Relational(RelationalPredicate),
    IsNull(NullnessPredicate),
    IsEmpty(EmptinessPredicate),
    Between(BetweenPredicate),
    Like(LikePredicate),
    MemberOf(MemberOfPredicate),
}

impl SqmNode for Predicate {
    fn accept<V: SemanticQueryVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Predicate::Grouped(p) => p.accept(visitor),
            Predicate::And(p) => p.accept(visitor),
            Predicate::Or(p) => p.accept(visitor),
            Predicate::Negated(p) => p.accept(visitor),
            Predicate::Relational(p) => p.accept(visitor),
            Predicate::IsNull(p) => p.accept(visitor),
            Predicate::IsEmpty(p) => p.accept(visitor),
            Predicate::Between(p) => p.accept(visitor),
            Predicate::Like(p) => p.accept(visitor),
            Predicate::MemberOf(p) => p.accept(visitor),
        }
    }
}

impl Predicate {
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(AndPredicate {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(OrPredicate {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn not(predicate: Predicate) -> Self {
        Predicate::Negated(NegatedPredicate {
            predicate: Box::new(predicate),
        })
    }

    pub fn grouped(predicate: Predicate) -> Self {
        Predicate::Grouped(GroupedPredicate {
            predicate: Box::new(predicate),
        })
    }

    pub fn relational(lhs: Expression, operator: RelationalOperator, rhs: Expression) -> Self {
        Predicate::Relational(RelationalPredicate { lhs, operator, rhs })
    }

    pub fn eq(lhs: Expression, rhs: Expression) -> Self {
        Self::relational(lhs, RelationalOperator::Equal, rhs)
    }

    pub fn is_null(expression: Expression, negated: bool) -> Self {
        Predicate::IsNull(NullnessPredicate { expression, negated })
    }

    pub fn is_empty(collection: AttributeReference, negated: bool) -> Self {
        Predicate::IsEmpty(EmptinessPredicate { collection, negated })
    }

    pub fn member_of(value: Expression, collection: AttributeReference, negated: bool) -> Self {
        Predicate::MemberOf(MemberOfPredicate {
            value,
            collection,
            negated,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedPredicate {
    pub predicate: Box<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndPredicate {
    pub left: Box<Predicate>,
    pub right: Box<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrPredicate {
    pub left: Box<Predicate>,
    pub right: Box<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegatedPredicate {
    pub predicate: Box<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalPredicate {
    pub lhs: Expression,
    pub operator: RelationalOperator,
    pub rhs: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullnessPredicate {
    pub expression: Expression,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptinessPredicate {
    pub collection: AttributeReference,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetweenPredicate {
    pub expression: Expression,
    pub lower_bound: Expression,
    pub upper_bound: Expression,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikePredicate {
    pub match_expression: Expression,
    pub pattern: Expression,
    #[serde(default)]
    pub escape_character: Option<Expression>,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOfPredicate {
    pub value: Expression,
    pub collection: AttributeReference,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    PositionalParameter(PositionalParameter),
    NamedParameter(NamedParameter),
    EntityType(EntityTypeLiteral),
    Unary(UnaryOperation),
    Attribute(AttributeReference),
    FromElement(FromElementReference),
    Function(FunctionCall),
    Literal(Literal),
    Concatenation(Concatenation),
    EnumConstant(ConstantEnum),
    FieldConstant(ConstantField),
    BinaryArithmetic(BinaryArithmetic),
}

impl SqmNode for Expression {
    fn accept<V: SemanticQueryVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expression::PositionalParameter(e) => e.accept(visitor),
            Expression::NamedParameter(e) => e.accept(visitor),
            Expression::EntityType(e) => e.accept(visitor),
            Expression::Unary(e) => e.accept(visitor),
            Expression::Attribute(e) => e.accept(visitor),
            Expression::FromElement(e) => e.accept(visitor),
            Expression::Function(e) => e.accept(visitor),
            Expression::Literal(e) => e.accept(visitor),
            Expression::Concatenation(e) => e.accept(visitor),
            Expression::EnumConstant(e) => e.accept(visitor),
            Expression::FieldConstant(e) => e.accept(visitor),
            Expression::BinaryArithmetic(e) => e.accept(visitor),
        }
    }
}

impl Expression {
    /// `alias.a.b` as an attribute reference
    pub fn path(dotted: &str) -> Self {
        Expression::Attribute(AttributeReference::parse(dotted))
    }

    pub fn from_element(alias: impl Into<String>) -> Self {
        Expression::FromElement(FromElementReference { alias: alias.into() })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn integer(value: i32) -> Self {
        Expression::Literal(Literal::Integer(value))
    }

    pub fn long(value: i64) -> Self {
        Expression::Literal(Literal::Long(value))
    }

    pub fn named_parameter(name: impl Into<String>) -> Self {
        Expression::NamedParameter(NamedParameter {
            name: name.into(),
            expected_type: None,
        })
    }

    pub fn positional_parameter(position: u32) -> Self {
        Expression::PositionalParameter(PositionalParameter {
            position,
            expected_type: None,
        })
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Function(FunctionCall {
            name: name.into(),
            arguments,
            result_type: None,
        })
    }

    pub fn concat(lhs: Expression, rhs: Expression) -> Self {
        Expression::Concatenation(Concatenation {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            explicit_type: None,
        })
    }

    pub fn arithmetic(lhs: Expression, operator: ArithmeticOperator, rhs: Expression) -> Self {
        Expression::BinaryArithmetic(BinaryArithmetic {
            lhs: Box::new(lhs),
            operator,
            rhs: Box::new(rhs),
            explicit_type: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalParameter {
    pub position: u32,
    #[serde(default)]
    pub expected_type: Option<DomainType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedParameter {
    pub name: String,
    #[serde(default)]
    pub expected_type: Option<DomainType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeLiteral {
    pub entity_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Plus,
    Minus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOperation {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
}

/// `alias.a.b`: a path rooted at a from-element alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeReference {
    pub lhs_alias: String,
    pub path: Vec<String>,
}

impl AttributeReference {
    pub fn new(lhs_alias: impl Into<String>, path: Vec<String>) -> Self {
        AttributeReference {
            lhs_alias: lhs_alias.into(),
            path,
        }
    }

    /// Split `alias.a.b` on dots; the first segment is the alias.
    pub fn parse(dotted: &str) -> Self {
        let mut segments = dotted.split('.').map(str::to_string);
        let lhs_alias = segments.next().unwrap_or_default();
        AttributeReference {
            lhs_alias,
            path: segments.collect(),
        }
    }

    pub fn dotted(&self) -> String {
        std::iter::once(self.lhs_alias.as_str())
            .chain(self.path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromElementReference {
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Expression>,
    #[serde(default)]
    pub result_type: Option<DomainType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Character(char),
    Double(f64),
    Integer(i32),
    /// Decimal digits
    BigInteger(String),
    /// Decimal text
    BigDecimal(String),
    Float(f32),
    Long(i64),
    True,
    False,
    Null,
}

impl SqmNode for Literal {
    fn accept<V: SemanticQueryVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Literal::String(value) => visitor.visit_literal_string(value),
            Literal::Character(value) => visitor.visit_literal_character(*value),
            Literal::Double(value) => visitor.visit_literal_double(*value),
            Literal::Integer(value) => visitor.visit_literal_integer(*value),
            Literal::BigInteger(value) => visitor.visit_literal_big_integer(value),
            Literal::BigDecimal(value) => visitor.visit_literal_big_decimal(value),
            Literal::Float(value) => visitor.visit_literal_float(*value),
            Literal::Long(value) => visitor.visit_literal_long(*value),
            Literal::True => visitor.visit_literal_true(),
            Literal::False => visitor.visit_literal_false(),
            Literal::Null => visitor.visit_literal_null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concatenation {
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    #[serde(default)]
    pub explicit_type: Option<DomainType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantEnum {
    pub enum_name: String,
    pub constant_name: String,
    pub ordinal: u32,
    /// Defaults to ordinal storage
    #[serde(default)]
    pub storage: Option<EnumStorage>,
}

/// Reference to a static constant, already resolved to its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantField {
    pub class_name: String,
    pub field_name: String,
    pub value: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryArithmetic {
    pub lhs: Box<Expression>,
    pub operator: ArithmeticOperator,
    pub rhs: Box<Expression>,
    #[serde(default)]
    pub explicit_type: Option<DomainType>,
}

impl_sqm_node! {
    SelectStatement => visit_select_statement,
    UpdateStatement => visit_update_statement,
    DeleteStatement => visit_delete_statement,
    Assignment => visit_assignment,
    QuerySpec => visit_query_spec,
    FromClause => visit_from_clause,
    FromElementSpace => visit_from_element_space,
    RootEntityFromElement => visit_root_entity_from_element,
    JoinedFromElement => visit_joined_from_element,
    SelectClause => visit_select_clause,
    SelectList => visit_select_list,
    SelectListItem => visit_select_list_item,
    DynamicInstantiation => visit_dynamic_instantiation,
    WhereClause => visit_where_clause,
    OrderByClause => visit_order_by_clause,
    SortSpecification => visit_sort_specification,
    GroupedPredicate => visit_grouped_predicate,
    AndPredicate => visit_and_predicate,
    OrPredicate => visit_or_predicate,
    NegatedPredicate => visit_negated_predicate,
    RelationalPredicate => visit_relational_predicate,
    NullnessPredicate => visit_is_null_predicate,
    EmptinessPredicate => visit_is_empty_predicate,
    BetweenPredicate => visit_between_predicate,
    LikePredicate => visit_like_predicate,
    MemberOfPredicate => visit_member_of_predicate,
    PositionalParameter => visit_positional_parameter,
    NamedParameter => visit_named_parameter,
    EntityTypeLiteral => visit_entity_type_literal,
    UnaryOperation => visit_unary_operation,
    AttributeReference => visit_attribute_reference,
    FromElementReference => visit_from_element_reference,
    FunctionCall => visit_function,
    Concatenation => visit_concatenation,
    ConstantEnum => visit_constant_enum,
    ConstantField => visit_constant_field,
    BinaryArithmetic => visit_binary_arithmetic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_reference_parse() {
        let reference = AttributeReference::parse("p.address.city");
        assert_eq!(reference.lhs_alias, "p");
        assert_eq!(reference.path, vec!["address", "city"]);
        assert_eq!(reference.dotted(), "p.address.city");
    }

    #[test]
    fn test_containing_space_lookup() {
        let from = FromClause::new(vec![
            FromElementSpace::new(RootEntityFromElement::new("Person", "p")).with_join(
                JoinedFromElement::attribute(SqmJoinType::Inner, "p", "orders", "o"),
            ),
            FromElementSpace::new(RootEntityFromElement::new("Company", "c")),
        ]);
        assert_eq!(from.containing_space("o"), Some(0));
        assert_eq!(from.containing_space("c"), Some(1));
        assert_eq!(from.containing_space("x"), None);
    }

    #[test]
    fn test_statement_from_json() {
        let json = r#"{
            "select": {
                "query_spec": {
                    "from_clause": { "spaces": [ { "root": { "entity_name": "Base", "alias": "b" } } ] },
                    "where_clause": {
                        "predicate": {
                            "relational": {
                                "lhs": { "attribute": { "lhs_alias": "b", "path": ["description"] } },
                                "operator": "equal",
                                "rhs": { "literal": { "string": "x" } }
                            }
                        }
                    }
                }
            }
        }"#;
        let statement: SqmStatement = serde_json::from_str(json).unwrap();
        let SqmStatement::Select(select) = statement else {
            panic!("expected a select statement");
        };
        assert_eq!(select.query_spec.from_clause.spaces[0].root.entity_name, "Base");
        assert!(select.query_spec.select_clause.is_none());
        assert_eq!(
            select.query_spec.where_clause.unwrap().predicate,
            Predicate::eq(Expression::path("b.description"), Expression::string("x"))
        );
    }
}
