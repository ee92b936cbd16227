//! ANY-typed attributes and elements fail the pass instead of degrading

use sqm_lowering::domain_metamodel::MetamodelError;
use sqm_lowering::sqm::{
    AttributeReference, Expression, FromClause, FromElementSpace, JoinedFromElement, Predicate,
    QuerySpec, RootEntityFromElement, SelectClause, SqmJoinType,
};
use sqm_lowering::{lower, LoweringError};

use super::common::*;

fn assert_unsupported(result: Result<(sqm_lowering::sql_ast::SqlAstTree, sqm_lowering::FromIndex), LoweringError>, expected_role: &str) {
    match result {
        Err(LoweringError::Metamodel(MetamodelError::UnsupportedMapping { role, .. })) => {
            assert_eq!(role, expected_role);
        }
        other => panic!("expected an unsupported mapping, got {:?}", other),
    }
}

fn join_from_holder(attribute: &str) -> QuerySpec {
    QuerySpec::new(FromClause::new(vec![FromElementSpace::new(RootEntityFromElement::new(
        "Holder", "h",
    ))
    .with_join(JoinedFromElement::attribute(SqmJoinType::Inner, "h", attribute, "t"))]))
}

#[test]
fn test_selecting_any_attribute_is_unsupported() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Holder", "h").with_select(SelectClause::of(vec![Expression::path("h.thing")])),
    );
    assert_unsupported(lower(&statement, &metamodel), "Holder.thing");
}

#[test]
fn test_dereferencing_any_attribute_is_unsupported() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Holder", "h").with_select(SelectClause::of(vec![Expression::path("h.thing.id")])),
    );
    assert_unsupported(lower(&statement, &metamodel), "Holder.thing");
}

#[test]
fn test_joining_any_attribute_is_unsupported() {
    let metamodel = shop_metamodel();
    assert_unsupported(lower(&select(join_from_holder("thing")), &metamodel), "Holder.thing");
}

#[test]
fn test_joining_collection_of_any_elements_is_unsupported() {
    let metamodel = shop_metamodel();
    assert_unsupported(lower(&select(join_from_holder("things")), &metamodel), "Holder.things");
}

#[test]
fn test_emptiness_of_any_collection_is_unsupported() {
    let metamodel = shop_metamodel();
    let statement = select(
        select_from("Holder", "h")
            .with_where(Predicate::is_empty(AttributeReference::parse("h.things"), false)),
    );
    assert_unsupported(lower(&statement, &metamodel), "Holder.things");
}
