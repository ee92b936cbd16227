//! Semantic Query Model: the typed, domain-resolved AST of an object query.

pub mod ast;
pub mod visitor;

pub use ast::*;
pub use visitor::SemanticQueryVisitor;
