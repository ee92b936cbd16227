//! Integration tests - lower complete statements against a YAML metamodel
//!
//! These tests drive the public API only: metamodel loading, configuration
//! and `lower`/`lower_with_config`.

mod common;
mod concurrency_tests;
mod config_tests;
mod hierarchy_tests;
mod join_tests;
mod predicate_tests;
mod statement_json_tests;
mod unsupported_mapping_tests;
