//! Configuration sources and their effect on a lowering pass

use std::env;
use std::io::Write;

use serial_test::serial;
use sqm_lowering::config::{CliConfig, LoweringConfig};
use sqm_lowering::{lower_with_config, LoweringError};

use super::common::*;

fn clear_env() {
    env::remove_var("SQM_ALIAS_PREFIX");
    env::remove_var("SQM_EXPAND_ALL_SUBCLASS_TABLES");
}

#[test]
fn test_custom_alias_prefix_drives_identification_variables() {
    let metamodel = shop_metamodel();
    let config = LoweringConfig {
        alias_prefix: "t".to_string(),
        ..Default::default()
    };

    let (tree, from_index) = lower_with_config(&select(select_from("Base", "b")), &metamodel, &config).unwrap();

    let root = &query_spec(&tree).from_clause.spaces[0].root;
    assert_eq!(root.identification_variables(), vec!["t1_0", "t1_1", "t1_2"]);
    assert!(from_index.find_by_alias_base("t1").is_some());
}

#[test]
fn test_invalid_config_is_rejected_before_lowering() {
    let metamodel = shop_metamodel();
    let config = LoweringConfig {
        alias_prefix: "9lives".to_string(),
        ..Default::default()
    };

    let err = lower_with_config(&select(select_from("Base", "b")), &metamodel, &config).unwrap_err();
    assert!(matches!(err, LoweringError::InvalidConfig { .. }));
}

#[test]
fn test_need_based_subclass_inclusion_is_rejected() {
    let metamodel = shop_metamodel();
    let config = LoweringConfig {
        expand_all_subclass_tables: false,
        ..Default::default()
    };

    let err = lower_with_config(&select(select_from("Base", "b")), &metamodel, &config).unwrap_err();
    assert!(matches!(err, LoweringError::InvalidConfig { .. }));
}

#[test]
#[serial]
fn test_yaml_config_is_overridden_by_cli() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "alias_prefix: y").unwrap();

    let from_yaml = LoweringConfig::load(Some(file.path()), &CliConfig::default()).unwrap();
    assert_eq!(from_yaml.alias_prefix, "y");

    let cli = CliConfig {
        alias_prefix: Some("c".to_string()),
        ..Default::default()
    };
    let overridden = LoweringConfig::load(Some(file.path()), &cli).unwrap();
    assert_eq!(overridden.alias_prefix, "c");
    assert!(overridden.expand_all_subclass_tables);
}

#[test]
#[serial]
fn test_environment_prefix_reaches_the_lowered_tree() {
    clear_env();
    env::set_var("SQM_ALIAS_PREFIX", "e");
    let config = LoweringConfig::load(None, &CliConfig::default());
    clear_env();
    let config = config.unwrap();

    let metamodel = shop_metamodel();
    let (tree, _) = lower_with_config(&select(select_from("Customer", "c")), &metamodel, &config).unwrap();
    assert_eq!(selected_columns(&tree, 0), vec!["e1_0.id"]);
}
