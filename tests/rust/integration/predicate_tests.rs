//! Where-clause lowering: collection predicates, parameters and junctions

use sqm_lowering::sql_ast::{JunctionKind, ParameterBinding, SqlPredicate};
use sqm_lowering::sqm::{
    AttributeReference, Expression, FromClause, FromElementSpace, Predicate, QuerySpec,
    RootEntityFromElement,
};
use sqm_lowering::lower;

use super::common::*;

fn where_predicate(tree: &sqm_lowering::sql_ast::SqlAstTree) -> &SqlPredicate {
    query_spec(tree)
        .where_predicate
        .as_ref()
        .expect("where predicate should be lowered")
}

#[test]
fn test_is_empty_becomes_correlated_not_exists() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Customer", "c")
            .with_where(Predicate::is_empty(AttributeReference::parse("c.orders"), false)),
    );

    let (tree, _) = lower(&statement, &metamodel).unwrap();

    match where_predicate(&tree) {
        SqlPredicate::Exists { subquery, negated } => {
            assert!(*negated);
            let group = &subquery.from_clause.spaces[0].root;
            assert_eq!(group.alias_base, "j2");
            assert_eq!(table_names(group), vec!["orders"]);
            match subquery.where_predicate.as_ref().unwrap() {
                SqlPredicate::Comparison { lhs, rhs, .. } => {
                    assert_eq!(qualified_columns(lhs), vec!["j2_0.customer_id"]);
                    assert_eq!(qualified_columns(rhs), vec!["j1_0.id"]);
                }
                other => panic!("unexpected correlation {:?}", other),
            }
        }
        other => panic!("expected EXISTS, got {:?}", other),
    }
}

#[test]
fn test_is_not_empty_becomes_exists() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Customer", "c")
            .with_where(Predicate::is_empty(AttributeReference::parse("c.orders"), true)),
    );

    let (tree, _) = lower(&statement, &metamodel).unwrap();
    assert!(matches!(
        where_predicate(&tree),
        SqlPredicate::Exists { negated: false, .. }
    ));
}

#[test]
fn test_member_of_many_to_many_selects_element_identifier() {
    let metamodel = shop_metamodel();
    let query_spec = QuerySpec::new(FromClause::new(vec![
        FromElementSpace::new(RootEntityFromElement::new("Post", "p")),
        FromElementSpace::new(RootEntityFromElement::new("Tag", "t")),
    ]))
    .with_where(Predicate::member_of(
        Expression::from_element("t"),
        AttributeReference::parse("p.tags"),
        false,
    ));

    let (tree, _) = lower(&select(query_spec), &metamodel).unwrap();

    match where_predicate(&tree) {
        SqlPredicate::InSubquery {
            expression,
            subquery,
            negated,
        } => {
            assert!(!*negated);
            assert_eq!(qualified_columns(expression), vec!["j2_0.tag_id"]);
            let group = &subquery.from_clause.spaces[0].root;
            assert_eq!(group.alias_base, "j3");
            assert_eq!(table_names(group), vec!["post_tag", "tag"]);
            match &subquery.selections[0].kind {
                sqm_lowering::sql_ast::SqlSelectionKind::Expression(selected) => {
                    assert_eq!(qualified_columns(selected), vec!["j3_1.tag_id"]);
                }
                other => panic!("unexpected selection {:?}", other),
            }
        }
        other => panic!("expected IN subquery, got {:?}", other),
    }
}

#[test]
fn test_parameters_are_collected_in_encounter_order() {
    let metamodel = shop_metamodel();
    let statement = select(select_from("Customer", "c").with_where(Predicate::or(
        Predicate::eq(Expression::path("c.name"), Expression::named_parameter("name")),
        Predicate::eq(Expression::path("c.id"), Expression::positional_parameter(1)),
    )));

    let (tree, _) = lower(&statement, &metamodel).unwrap();

    let bindings: Vec<&ParameterBinding> = tree.parameters().iter().map(|p| &p.binding).collect();
    assert_eq!(
        bindings,
        vec![
            &ParameterBinding::Named("name".to_string()),
            &ParameterBinding::Positional(1)
        ]
    );
    let indexes: Vec<usize> = tree.parameters().iter().map(|p| p.index).collect();
    assert_eq!(indexes, vec![0, 1]);
    assert!(matches!(
        where_predicate(&tree),
        SqlPredicate::Junction {
            kind: JunctionKind::Disjunction,
            ..
        }
    ));
}

#[test]
fn test_foreign_key_identifier_needs_no_join() {
    let metamodel = shop_metamodel();
    let statement = select(select_from("Order", "o").with_where(Predicate::eq(
        Expression::path("o.customer.id"),
        Expression::long(7),
    )));

    let (tree, _) = lower(&statement, &metamodel).unwrap();

    assert!(query_spec(&tree).from_clause.spaces[0].joins.is_empty());
    match where_predicate(&tree) {
        SqlPredicate::Comparison { lhs, .. } => {
            assert_eq!(qualified_columns(lhs), vec!["j1_0.customer_id"]);
        }
        other => panic!("unexpected predicate {:?}", other),
    }
}
