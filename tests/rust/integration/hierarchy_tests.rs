//! Joined-inheritance expansion and identification variable assignment

use std::collections::HashSet;

use sqm_lowering::domain_metamodel::MetamodelError;
use sqm_lowering::sql_ast::SqlJoinType;
use sqm_lowering::sqm::{
    Expression, FromClause, FromElementSpace, QuerySpec, RootEntityFromElement, SelectClause,
};
use sqm_lowering::{lower, LoweringError};

use super::common::*;

#[test]
fn test_base_root_expands_every_subclass_table() {
    let metamodel = shop_metamodel();
    let statement = select(select_from("Base", "b"));

    let (tree, from_index) = lower(&statement, &metamodel).unwrap();
    let spec = query_spec(&tree);

    assert_eq!(spec.from_clause.spaces.len(), 1);
    let root = &spec.from_clause.spaces[0].root;
    assert_eq!(root.alias_base, "j1");
    assert_eq!(root.identification_variables(), vec!["j1_0", "j1_1", "j1_2"]);
    assert_eq!(table_names(root), vec!["base", "branch", "leaf"]);
    assert!(root
        .table_joins
        .iter()
        .all(|join| join.join_type == SqlJoinType::Left && join.predicate.is_none()));

    assert_eq!(from_index.len(), 1);
    assert_eq!(selected_columns(&tree, 0), vec!["j1_0.id"]);
}

#[test]
fn test_leaf_root_starts_at_its_own_table() {
    let metamodel = shop_metamodel();
    let statement = select(select_from("Leaf", "l"));

    let (tree, _) = lower(&statement, &metamodel).unwrap();
    let root = &query_spec(&tree).from_clause.spaces[0].root;

    assert_eq!(table_names(root), vec!["leaf", "branch", "base"]);
    assert_eq!(root.identification_variables(), vec!["j1_0", "j1_1", "j1_2"]);
}

#[test]
fn test_inherited_attributes_resolve_to_their_declaring_table() {
    let metamodel = shop_metamodel();
    let statement = select(select_from("Leaf", "l").with_select(SelectClause::of(vec![
        Expression::path("l.color"),
        Expression::path("l.level"),
        Expression::path("l.description"),
    ])));

    let (tree, _) = lower(&statement, &metamodel).unwrap();

    assert_eq!(selected_columns(&tree, 0), vec!["j1_0.color"]);
    assert_eq!(selected_columns(&tree, 1), vec!["j1_1.level"]);
    assert_eq!(selected_columns(&tree, 2), vec!["j1_2.description"]);
}

#[test]
fn test_unknown_attribute_is_reported() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Base", "b").with_select(SelectClause::of(vec![Expression::path("b.weight")])),
    );

    let err = lower(&statement, &metamodel).unwrap_err();
    assert!(
        matches!(
            &err,
            LoweringError::Metamodel(MetamodelError::UnknownAttribute { attribute_name, .. })
                if attribute_name == "weight"
        ),
        "unexpected error: {:?}",
        err
    );
}

#[test]
fn test_unknown_entity_is_reported() {
    let metamodel = shop_metamodel();
    let statement = select(select_from("Invoice", "i"));

    let err = lower(&statement, &metamodel).unwrap_err();
    assert!(matches!(
        err,
        LoweringError::Metamodel(MetamodelError::UnknownEntity { .. })
    ));
}

#[test]
fn test_identification_variables_are_unique_across_spaces() {
    let metamodel = shop_metamodel();
    let query_spec = QuerySpec::new(FromClause::new(vec![
        FromElementSpace::new(RootEntityFromElement::new("Base", "b")),
        FromElementSpace::new(RootEntityFromElement::new("Leaf", "l")),
        FromElementSpace::new(RootEntityFromElement::unaliased("Customer")),
    ]));

    let (tree, from_index) = lower(&select(query_spec), &metamodel).unwrap();

    let mut seen = HashSet::new();
    for group in tree.from_clause().groups() {
        for variable in group.identification_variables() {
            assert!(seen.insert(variable.to_string()), "duplicate variable {}", variable);
        }
    }
    assert_eq!(seen.len(), 7);
    assert_eq!(from_index.len(), 3);

    let bases: Vec<&str> = tree.from_clause().groups().map(|g| g.alias_base.as_str()).collect();
    assert_eq!(bases, vec!["j1", "j2", "j3"]);
}

#[test]
fn test_lowering_is_deterministic() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Base", "b")
            .with_select(SelectClause::of(vec![Expression::path("b.description")]))
            .with_where(sqm_lowering::sqm::Predicate::eq(
                Expression::path("b.description"),
                Expression::named_parameter("d"),
            )),
    );

    let first = lower(&statement, &metamodel).unwrap();
    let second = lower(&statement, &metamodel).unwrap();
    assert_eq!(first, second);
}
