//! brine-colf
//!
//! This crate provides runtime support for working with Colfer-encoded data.
//!
//! - The wire codec used by generated Rust code (re-exported from schema):
//!   `ByteBuffer`, `ByteBufferMut`, `Timestamp`, `WireError` and the
//!   `Colfer` trait
//! - The schema compiler, under `compiler`, for build scripts

pub use brine_colf_schema::*;

pub use brine_colf_compiler as compiler;

pub mod error {
    pub use brine_colf_compiler::error::{CompileError, SchemaError};
    pub use brine_colf_schema::WireError;
}
