//! Statements deserialized from their JSON form

use sqm_lowering::sql_ast::{SqlAstTree, SqlPredicate};
use sqm_lowering::sqm::SqmStatement;
use sqm_lowering::lower;

use super::common::*;

const SELECT_JSON: &str = r#"{
  "select": {
    "query_spec": {
      "from_clause": {
        "spaces": [
          {
            "root": { "entity_name": "Customer", "alias": "c" },
            "joins": [
              {
                "alias": "o",
                "join_type": "left",
                "source": { "attribute": { "lhs_alias": "c", "attribute": "orders" } }
              }
            ]
          }
        ]
      },
      "select_clause": {
        "list": {
          "items": [
            { "selection": { "expression": { "attribute": { "lhs_alias": "c", "path": ["name"] } } } },
            { "selection": { "expression": { "attribute": { "lhs_alias": "o", "path": ["total"] } } }, "alias": "total" }
          ]
        }
      },
      "where_clause": {
        "predicate": {
          "relational": {
            "lhs": { "attribute": { "lhs_alias": "c", "path": ["name"] } },
            "operator": "equal",
            "rhs": { "named_parameter": { "name": "name" } }
          }
        }
      }
    }
  }
}"#;

#[test]
fn test_select_statement_from_json() {
    let statement: SqmStatement = serde_json::from_str(SELECT_JSON).unwrap();
    let metamodel = shop_metamodel();

    let (tree, from_index) = lower(&statement, &metamodel).unwrap();

    assert_eq!(from_index.len(), 2);
    assert_eq!(selected_columns(&tree, 0), vec!["j1_0.name"]);
    assert_eq!(selected_columns(&tree, 1), vec!["j2_0.total"]);
    assert_eq!(query_spec(&tree).selections[1].alias.as_deref(), Some("total"));
    assert!(matches!(
        query_spec(&tree).where_predicate,
        Some(SqlPredicate::Comparison { .. })
    ));
    assert_eq!(tree.parameters().len(), 1);
}

#[test]
fn test_delete_statement_from_json() {
    let json = r#"{ "delete": { "target": { "entity_name": "Leaf", "alias": "l" } } }"#;
    let statement: SqmStatement = serde_json::from_str(json).unwrap();
    let metamodel = shop_metamodel();

    let (tree, _) = lower(&statement, &metamodel).unwrap();

    match tree {
        SqlAstTree::Delete(delete) => {
            assert_eq!(delete.from_clause.spaces.len(), 1);
            assert_eq!(table_names(&delete.from_clause.spaces[0].root), vec!["leaf", "branch", "base"]);
            assert!(delete.where_predicate.is_none());
        }
        other => panic!("expected a delete tree, got {:?}", other),
    }
}

#[test]
fn test_lowered_tree_serializes_to_json() {
    let statement: SqmStatement = serde_json::from_str(SELECT_JSON).unwrap();
    let metamodel = shop_metamodel();
    let (tree, from_index) = lower(&statement, &metamodel).unwrap();

    let value = serde_json::json!({ "sql_ast": tree, "from_index": from_index });
    assert!(value["sql_ast"]["select"]["query_spec"]["from_clause"]["spaces"].is_array());
}
