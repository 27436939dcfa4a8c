//! Application layer: the compilation pipeline stages.

pub mod build;
pub mod codegen;
pub mod lexer;
pub mod pipeline;
pub mod source;
pub mod validate;
