//! Runtime support for code generated by the Colf compiler. See the
//! compiler crate for the schema language.
//!
//! A serialized struct is a start marker, a sparse sequence of field
//! entries, and an end marker. Each entry starts with a tag byte holding the
//! field index in its low 7 bits; the high bit is a variant flag whose
//! meaning depends on the field type.
//!
//! ```
//! use brine_colf_schema::*;
//!
//! let mut bb = ByteBufferMut::new();
//! bb.write_byte(START).unwrap();
//! bb.write_signed32(0, -5).unwrap();
//! bb.write_byte(END).unwrap();
//! let data = bb.data();
//! assert_eq!(data, [0x80, 0x80, 0x05, 0x7f]);
//!
//! let mut bb = ByteBuffer::new(&data);
//! bb.read_start().unwrap();
//! assert_eq!(bb.read_byte(), Ok(0 | FLAG));
//! assert_eq!(bb.read_negated32(), Ok(-5));
//! assert_eq!(bb.read_byte(), Ok(END));
//! bb.close_struct();
//! ```

pub mod bb;
pub mod colfer;
pub mod error;
pub mod timestamp;

pub use bb::*;
pub use colfer::Colfer;
pub use error::WireError;
pub use timestamp::Timestamp;

/// First byte of every serial struct.
pub const START: u8 = 0x80;
/// Last byte of every serial struct.
pub const END: u8 = 0x7f;
/// High bit of a tag byte, the type-specific variant flag.
pub const FLAG: u8 = 0x80;
/// Largest field index a tag byte can carry.
pub const MAX_INDEX: u8 = 0x7e;

/// Largest number of nested struct envelopes a reader accepts, the outermost
/// one included.
pub const MAX_DEPTH: usize = 100;

/// Default upper limit for serial byte sizes.
pub const DEFAULT_SIZE_MAX: usize = 16 * 1024 * 1024;
/// Default upper limit for the number of elements in a list.
pub const DEFAULT_LIST_MAX: usize = 64 * 1024;
