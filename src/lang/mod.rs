//! # Hello language model
//!
//! The abstract syntax tree produced by the parser and walked by the code
//! generator, plus the source-span table shared between the two.

pub mod node;
pub mod span;

pub use node::{BinaryOperator, Constant, Node, Sequence, UnaryOperator};
pub use span::{SourcePos, Stmt, StmtId, StmtTable};
