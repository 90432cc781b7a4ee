//! Graph statements, options, and result materialization.

pub mod options;
pub mod result;
pub mod statement;

pub use options::{GraphOptions, OptionsMap};
pub use result::{Edge, GraphResult, GraphResultSet, Path, Vertex};
pub use statement::{SimpleGraphStatement, Statement, TargetedStatement};
