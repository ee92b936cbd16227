//! SQM to SQL AST lowering.
//!
//! `lower` runs one pass: a fresh converter (alias bases, from-index,
//! parameter list) visits the statement against a read-only metamodel. The
//! pass either returns the complete tree with its from-index or fails with
//! the first error raised; nothing is shared between passes.

pub mod alias_base_manager;
pub mod errors;
pub mod from_clause_index;
pub mod function_registry;
pub mod path_resolver;
pub mod sqm_to_sql;
pub mod table_group_builder;

use validator::Validate;

use crate::config::LoweringConfig;
use crate::domain_metamodel::metamodel::DomainMetamodel;
use crate::sql_ast::SqlAstTree;
use crate::sqm::{SqmNode, SqmStatement};

pub use alias_base_manager::AliasBaseManager;
pub use errors::LoweringError;
pub use from_clause_index::{FromIndex, GroupPosition, TableGroupLocator, TableGroupRef, TableGroupSource};
pub use sqm_to_sql::{Lowered, SqmToSqlConverter};
pub use table_group_builder::TableGroupBuilder;

/// Lower `statement` with the default configuration.
pub fn lower(
    statement: &SqmStatement,
    metamodel: &DomainMetamodel,
) -> Result<(SqlAstTree, FromIndex), LoweringError> {
    lower_with_config(statement, metamodel, &LoweringConfig::default())
}

pub fn lower_with_config(
    statement: &SqmStatement,
    metamodel: &DomainMetamodel,
    config: &LoweringConfig,
) -> Result<(SqlAstTree, FromIndex), LoweringError> {
    config.validate().map_err(|e| LoweringError::InvalidConfig {
        message: e.to_string(),
    })?;

    let mut converter = SqmToSqlConverter::new(metamodel, config);
    let tree = statement.accept(&mut converter)?.into_tree()?;
    let from_index = converter.into_from_index();
    log::debug!(
        "lower: {} from-element(s), {} table group(s), {} parameter(s)",
        from_index.len(),
        tree.from_clause().groups().count(),
        tree.parameters().len()
    );
    Ok((tree, from_index))
}
