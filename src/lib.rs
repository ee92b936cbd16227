//! SQM Lowering - Semantic Query Model to SQL AST
//!
//! This crate lowers parsed object-query statements into a relational tree:
//! - Domain metamodel built from entity mappings (YAML or any `EntityMappingInfo`)
//! - SQM node set with a double-dispatch visitor protocol
//! - Table-group expansion of inheritance-mapped entities
//! - SQL AST with deterministic alias assignment and a from-element index

pub mod config;
pub mod domain_metamodel;
pub mod lowering;
pub mod sql_ast;
pub mod sqm;

pub use lowering::{lower, lower_with_config, FromIndex, LoweringError};
