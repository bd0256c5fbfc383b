// Chart request DSL parser

pub mod ast;
pub mod chart;
pub mod labels;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::{ChartSpec, Labels, RequestSpec};
pub use pipeline::parse_request;
