use std::path::PathBuf;

use sqm_lowering::domain_metamodel::{DomainMetamodel, MetamodelConfig};
use sqm_lowering::sql_ast::{SqlAstTree, SqlExpression, SqlSelectionKind, TableGroup};
use sqm_lowering::sqm::{FromClause, QuerySpec, RootEntityFromElement, SelectStatement, SqmStatement};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn shop_metamodel() -> DomainMetamodel {
    MetamodelConfig::from_yaml_file(fixture_path("shop_metamodel.yaml"))
        .expect("fixture should parse")
        .build_metamodel()
        .expect("fixture should build")
}

pub fn select(query_spec: QuerySpec) -> SqmStatement {
    SqmStatement::Select(SelectStatement { query_spec })
}

pub fn select_from(entity_name: &str, alias: &str) -> QuerySpec {
    QuerySpec::new(FromClause::single(RootEntityFromElement::new(entity_name, alias)))
}

pub fn query_spec(tree: &SqlAstTree) -> &sqm_lowering::sql_ast::QuerySpec {
    match tree {
        SqlAstTree::Select(select) => &select.query_spec,
        other => panic!("expected a select tree, got {:?}", other),
    }
}

pub fn table_names(group: &TableGroup) -> Vec<String> {
    group
        .tables()
        .map(|table| table.reference.table_expression().to_string())
        .collect()
}

/// `identification_variable.column` for every column of a selection
pub fn selected_columns(tree: &SqlAstTree, index: usize) -> Vec<String> {
    match &query_spec(tree).selections[index].kind {
        SqlSelectionKind::Expression(expression) => qualified_columns(expression),
        other => panic!("expected an expression selection, got {:?}", other),
    }
}

pub fn qualified_columns(expression: &SqlExpression) -> Vec<String> {
    expression
        .column_references()
        .into_iter()
        .map(|column| format!("{}.{}", column.identification_variable, column.expression.text()))
        .collect()
}
