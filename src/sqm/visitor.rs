//! SQM Visitor Protocol
//!
//! [`SemanticQueryVisitor`] has one method per concrete SQM node variant and
//! no default implementations, so every visitor handles the complete node
//! set. Adding a node variant breaks every visitor at compile time.
//!
//! Traversal order is the visitor's business: nodes only dispatch
//! (`node.accept(visitor)`), they never recurse on their own.
//!
//! # Example
//!
//! ```ignore
//! struct Lowering { /* pass state */ }
//!
//! impl SemanticQueryVisitor for Lowering {
//!     type Output = Result<Lowered, LoweringError>;
//!
//!     fn visit_where_clause(&mut self, clause: &WhereClause) -> Self::Output {
//!         clause.predicate.accept(self)
//!     }
//!     // ... one method per node variant
//! }
//! ```

use super::ast::*;

pub trait SemanticQueryVisitor {
    type Output;

    // statements
    fn visit_select_statement(&mut self, statement: &SelectStatement) -> Self::Output;
    fn visit_update_statement(&mut self, statement: &UpdateStatement) -> Self::Output;
    fn visit_delete_statement(&mut self, statement: &DeleteStatement) -> Self::Output;
    fn visit_assignment(&mut self, assignment: &Assignment) -> Self::Output;

    // query structure
    fn visit_query_spec(&mut self, query_spec: &QuerySpec) -> Self::Output;
    fn visit_from_clause(&mut self, from_clause: &FromClause) -> Self::Output;
    fn visit_from_element_space(&mut self, space: &FromElementSpace) -> Self::Output;
    fn visit_root_entity_from_element(&mut self, root: &RootEntityFromElement) -> Self::Output;
    fn visit_joined_from_element(&mut self, join: &JoinedFromElement) -> Self::Output;
    fn visit_select_clause(&mut self, select_clause: &SelectClause) -> Self::Output;
    fn visit_select_list(&mut self, select_list: &SelectList) -> Self::Output;
    fn visit_select_list_item(&mut self, item: &SelectListItem) -> Self::Output;
    fn visit_dynamic_instantiation(&mut self, instantiation: &DynamicInstantiation) -> Self::Output;
    fn visit_where_clause(&mut self, where_clause: &WhereClause) -> Self::Output;
    fn visit_order_by_clause(&mut self, order_by: &OrderByClause) -> Self::Output;
    fn visit_sort_specification(&mut self, sort: &SortSpecification) -> Self::Output;

    // predicates
    fn visit_grouped_predicate(&mut self, predicate: &GroupedPredicate) -> Self::Output;
    fn visit_and_predicate(&mut self, predicate: &AndPredicate) -> Self::Output;
    fn visit_or_predicate(&mut self, predicate: &OrPredicate) -> Self::Output;
    fn visit_negated_predicate(&mut self, predicate: &NegatedPredicate) -> Self::Output;
    fn visit_relational_predicate(&mut self, predicate: &RelationalPredicate) -> Self::Output;
    fn visit_is_null_predicate(&mut self, predicate: &NullnessPredicate) -> Self::Output;
    fn visit_is_empty_predicate(&mut self, predicate: &EmptinessPredicate) -> Self::Output;
    fn visit_between_predicate(&mut self, predicate: &BetweenPredicate) -> Self::Output;
    fn visit_like_predicate(&mut self, predicate: &LikePredicate) -> Self::Output;
    fn visit_member_of_predicate(&mut self, predicate: &MemberOfPredicate) -> Self::Output;

    // expressions
    fn visit_positional_parameter(&mut self, parameter: &PositionalParameter) -> Self::Output;
    fn visit_named_parameter(&mut self, parameter: &NamedParameter) -> Self::Output;
    fn visit_entity_type_literal(&mut self, literal: &EntityTypeLiteral) -> Self::Output;
    fn visit_unary_operation(&mut self, operation: &UnaryOperation) -> Self::Output;
    fn visit_attribute_reference(&mut self, reference: &AttributeReference) -> Self::Output;
    fn visit_from_element_reference(&mut self, reference: &FromElementReference) -> Self::Output;
    fn visit_function(&mut self, function: &FunctionCall) -> Self::Output;
    fn visit_concatenation(&mut self, concatenation: &Concatenation) -> Self::Output;
    fn visit_constant_enum(&mut self, constant: &ConstantEnum) -> Self::Output;
    fn visit_constant_field(&mut self, constant: &ConstantField) -> Self::Output;
    fn visit_binary_arithmetic(&mut self, arithmetic: &BinaryArithmetic) -> Self::Output;

    // literals
    fn visit_literal_string(&mut self, value: &str) -> Self::Output;
    fn visit_literal_character(&mut self, value: char) -> Self::Output;
    fn visit_literal_double(&mut self, value: f64) -> Self::Output;
    fn visit_literal_integer(&mut self, value: i32) -> Self::Output;
    fn visit_literal_big_integer(&mut self, digits: &str) -> Self::Output;
    fn visit_literal_big_decimal(&mut self, text: &str) -> Self::Output;
    fn visit_literal_float(&mut self, value: f32) -> Self::Output;
    fn visit_literal_long(&mut self, value: i64) -> Self::Output;
    fn visit_literal_true(&mut self) -> Self::Output;
    fn visit_literal_false(&mut self) -> Self::Output;
    fn visit_literal_null(&mut self) -> Self::Output;
}
