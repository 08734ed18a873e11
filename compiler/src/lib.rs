//! brine-colf-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.colf` schema files,
//!  2) A resolver that builds the IR (packages, indexed fields, resolved
//!     struct references, per-package limits),
//!  3) Code generation through one [`gen::Backend`] per target language
//!     (Rust, Go and Java),
//!  4) A reference value codec (`value::encode` / `value::decode`) that
//!     models the wire format against the IR,
//!  5) A schema formatter, and the error types (`SchemaError`, `CompileError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod limits;
pub mod config;
pub mod ir;
pub mod resolver;
pub mod value;
pub mod format;
pub mod gen;
pub mod compiler;

pub use compiler::{compile_files, compile_sources, compile_to, compile_with};
pub use config::CompileConfig;
pub use error::{CompileError, LimitConfigError, SchemaError};
pub use format::{format_file, format_schema};
pub use gen::{generate, Backend, Language};
pub use ir::Schema;
