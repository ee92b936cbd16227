//! Attribute joins: to-one, one-to-many, many-to-many and element collections

use sqm_lowering::sql_ast::{SqlJoinType, SqlPredicate, TableGroupKind};
use sqm_lowering::sqm::{
    AttributeReference, Expression, FromClause, FromElementSpace, JoinedFromElement, Predicate,
    QuerySpec, RootEntityFromElement, SelectClause, SqmJoinType,
};
use sqm_lowering::{lower, LoweringError};

use super::common::*;

fn with_joins(root: RootEntityFromElement, joins: Vec<JoinedFromElement>) -> QuerySpec {
    let space = joins
        .into_iter()
        .fold(FromElementSpace::new(root), FromElementSpace::with_join);
    QuerySpec::new(FromClause::new(vec![space]))
}

fn equality_columns(predicate: &SqlPredicate) -> (Vec<String>, Vec<String>) {
    match predicate {
        SqlPredicate::Comparison { lhs, rhs, .. } => (qualified_columns(lhs), qualified_columns(rhs)),
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_primary_key_one_to_one_joins_on_owner_identifier() {
    let metamodel = shop_metamodel();
    let query_spec = with_joins(
        RootEntityFromElement::new("Person", "p"),
        vec![JoinedFromElement::attribute(SqmJoinType::Inner, "p", "profile", "pr")],
    );

    let (tree, from_index) = lower(&select(query_spec), &metamodel).unwrap();
    let join = &first_space(&tree).joins[0];

    assert_eq!(join.join_type, SqlJoinType::Inner);
    assert_eq!(table_names(&join.group), vec!["profile"]);
    let (lhs, rhs) = equality_columns(join.predicate.as_ref().unwrap());
    assert_eq!(lhs, vec!["j1_0.person_id"]);
    assert_eq!(rhs, vec!["j2_0.profile_id"]);
    assert!(from_index.find("pr").is_some());
}

#[test]
fn test_many_to_many_join_spans_link_and_element_tables() {
    let metamodel = shop_metamodel();
    let query_spec = with_joins(
        RootEntityFromElement::new("Post", "p"),
        vec![JoinedFromElement::attribute(SqmJoinType::Left, "p", "tags", "t")],
    )
    .with_select(SelectClause::of(vec![Expression::path("t.label")]));

    let (tree, _) = lower(&select(query_spec), &metamodel).unwrap();
    let join = &first_space(&tree).joins[0];

    assert_eq!(join.join_type, SqlJoinType::Left);
    assert_eq!(
        join.group.kind,
        TableGroupKind::Collection {
            role: "Post.tags".to_string()
        }
    );
    assert_eq!(table_names(&join.group), vec!["post_tag", "tag"]);
    let (lhs, rhs) = equality_columns(join.predicate.as_ref().unwrap());
    assert_eq!(lhs, vec!["j2_0.post_id"]);
    assert_eq!(rhs, vec!["j1_0.id"]);

    // element attributes read from the element table, not the link table
    assert_eq!(selected_columns(&tree, 0), vec!["j2_1.label"]);
}

#[test]
fn test_element_collection_join_selects_element_column() {
    let metamodel = shop_metamodel();
    let query_spec = with_joins(
        RootEntityFromElement::new("Post", "p"),
        vec![JoinedFromElement::attribute(SqmJoinType::Inner, "p", "keywords", "k")],
    )
    .with_select(SelectClause::of(vec![Expression::from_element("k")]));

    let (tree, _) = lower(&select(query_spec), &metamodel).unwrap();
    let join = &first_space(&tree).joins[0];

    assert_eq!(table_names(&join.group), vec!["post_keyword"]);
    assert_eq!(selected_columns(&tree, 0), vec!["j2_0.keyword"]);
}

#[test]
fn test_one_to_many_join_uses_element_entity_tables() {
    let metamodel = shop_metamodel();
    let query_spec = with_joins(
        RootEntityFromElement::new("Customer", "c"),
        vec![JoinedFromElement::attribute(SqmJoinType::Inner, "c", "orders", "o")],
    )
    .with_select(SelectClause::of(vec![Expression::path("o.total")]));

    let (tree, _) = lower(&select(query_spec), &metamodel).unwrap();
    let join = &first_space(&tree).joins[0];

    assert_eq!(table_names(&join.group), vec!["orders"]);
    let (lhs, rhs) = equality_columns(join.predicate.as_ref().unwrap());
    assert_eq!(lhs, vec!["j2_0.customer_id"]);
    assert_eq!(rhs, vec!["j1_0.id"]);
    assert_eq!(selected_columns(&tree, 0), vec!["j2_0.total"]);
}

#[test]
fn test_right_and_full_joins_are_unsupported() {
    let metamodel = shop_metamodel();
    for join_type in [SqmJoinType::Right, SqmJoinType::Full] {
        let query_spec = with_joins(
            RootEntityFromElement::new("Customer", "c"),
            vec![JoinedFromElement::attribute(join_type, "c", "orders", "o")],
        );
        let err = lower(&select(query_spec), &metamodel).unwrap_err();
        assert!(
            matches!(err, LoweringError::UnsupportedJoinType { join_type: found } if found == join_type),
            "unexpected error: {:?}",
            err
        );
    }
}

#[test]
fn test_join_from_unknown_alias_fails() {
    let metamodel = shop_metamodel();
    let query_spec = with_joins(
        RootEntityFromElement::new("Customer", "c"),
        vec![JoinedFromElement::attribute(SqmJoinType::Inner, "x", "orders", "o")],
    );
    let err = lower(&select(query_spec), &metamodel).unwrap_err();
    assert!(matches!(err, LoweringError::UnknownFromElement { alias } if alias == "x"));
}

fn first_space(tree: &sqm_lowering::sql_ast::SqlAstTree) -> &sqm_lowering::sql_ast::TableSpace {
    &query_spec(tree).from_clause.spaces[0]
}

#[test]
fn test_subquery_in_join_condition_does_not_shift_later_aliases() {
    let metamodel = shop_metamodel();
    let query_spec = with_joins(
        RootEntityFromElement::new("Customer", "c"),
        vec![
            JoinedFromElement::attribute(SqmJoinType::Inner, "c", "orders", "o")
                .with_on(Predicate::is_empty(AttributeReference::parse("c.orders"), true)),
            JoinedFromElement::attribute(SqmJoinType::Inner, "o", "customer", "x"),
        ],
    );

    let (tree, from_index) = lower(&select(query_spec), &metamodel).unwrap();

    assert_eq!(from_index.find("c").unwrap().alias_base, "j1");
    assert_eq!(from_index.find("o").unwrap().alias_base, "j2");
    assert_eq!(from_index.find("x").unwrap().alias_base, "j3");

    let exists = match first_space(&tree).joins[0].predicate.as_ref().unwrap() {
        SqlPredicate::Junction { predicates, .. } => predicates
            .iter()
            .find_map(|predicate| match predicate {
                SqlPredicate::Exists { subquery, negated } => Some((subquery, *negated)),
                _ => None,
            })
            .expect("join condition should carry the emptiness subquery"),
        other => panic!("expected the key equality AND the join condition, got {:?}", other),
    };
    assert!(!exists.1);
    assert_eq!(exists.0.from_clause.spaces[0].root.alias_base, "j4");
    assert_eq!(first_space(&tree).joins[1].group.alias_base, "j3");
}
