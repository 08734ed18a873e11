use std::str;

use crate::{error::WireError, timestamp::Timestamp, FLAG, MAX_DEPTH, START};

/// A Colf byte buffer meant for reading.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_colf_schema::ByteBuffer::new(&[0x80, 0x01, 0x03, 0x61, 0x62, 0x63]);
/// assert_eq!(bb.read_start(), Ok(()));
/// assert_eq!(bb.read_varint32(), Ok(1));
/// assert_eq!(bb.read_text(16), Ok("abc".to_owned()));
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
    depth: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0, depth: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, WireError> {
        if self.index >= self.data.len() {
            Err(WireError::Truncated)
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if len > self.remaining() {
            Err(WireError::Truncated)
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    /// Consumes the start marker of a struct envelope. Envelopes nest at
    /// most [`MAX_DEPTH`] deep; each one is closed with [`Self::close_struct`].
    pub fn read_start(&mut self) -> Result<(), WireError> {
        let offset = self.index;
        match self.read_byte()? {
            START => {}
            byte => return Err(WireError::MalformedTag { byte, offset }),
        }
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(WireError::LimitExceeded {
                what: "depth".to_owned(),
                len: self.depth,
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }

    /// Leaves the innermost envelope once its end marker was read.
    pub fn close_struct(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Number of envelopes opened and not yet closed.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Try to read an unsigned 32-bit varint. The fifth byte, when reached,
    /// carries the top four bits and has no continuation.
    pub fn read_varint32(&mut self) -> Result<u32, WireError> {
        let mut result: u32 = 0;
        let mut shift = 0;
        while shift != 28 {
            let byte = self.read_byte()?;
            result |= ((byte & 0x7f) as u32) << shift;
            if byte < 0x80 {
                return Ok(result);
            }
            shift += 7;
        }
        let byte = self.read_byte()?;
        Ok(result | (byte as u32) << 28)
    }

    /// Try to read an unsigned 64-bit varint. The ninth byte, when reached,
    /// uses all eight bits and has no continuation.
    pub fn read_varint64(&mut self) -> Result<u64, WireError> {
        let mut result: u64 = 0;
        let mut shift = 0;
        while shift != 56 {
            let byte = self.read_byte()?;
            result |= ((byte & 0x7f) as u64) << shift;
            if byte < 0x80 {
                return Ok(result);
            }
            shift += 7;
        }
        let byte = self.read_byte()?;
        Ok(result | (byte as u64) << 56)
    }

    /// Reads a non-negative 32-bit integer entry.
    pub fn read_positive32(&mut self) -> Result<i32, WireError> {
        let offset = self.index;
        let x = self.read_varint32()?;
        i32::try_from(x).map_err(|_| WireError::IntegerOverflow { offset })
    }

    /// Reads a non-negative 64-bit integer entry.
    pub fn read_positive64(&mut self) -> Result<i64, WireError> {
        let offset = self.index;
        let x = self.read_varint64()?;
        i64::try_from(x).map_err(|_| WireError::IntegerOverflow { offset })
    }

    /// Reads the magnitude of a negative 32-bit integer and negates it with
    /// bit complement plus one.
    pub fn read_negated32(&mut self) -> Result<i32, WireError> {
        let offset = self.index;
        let x = self.read_varint32()?;
        if x > 1 << 31 {
            return Err(WireError::IntegerOverflow { offset });
        }
        Ok((!x).wrapping_add(1) as i32)
    }

    /// Reads the magnitude of a negative 64-bit integer and negates it with
    /// bit complement plus one.
    pub fn read_negated64(&mut self) -> Result<i64, WireError> {
        let offset = self.index;
        let x = self.read_varint64()?;
        if x > 1 << 63 {
            return Err(WireError::IntegerOverflow { offset });
        }
        Ok((!x).wrapping_add(1) as i64)
    }

    /// Zig-zag decoded 32-bit integer, as used for list elements.
    pub fn read_zigzag32(&mut self) -> Result<i32, WireError> {
        let x = self.read_varint32()?;
        Ok(((x >> 1) as i32) ^ -((x & 1) as i32))
    }

    /// Zig-zag decoded 64-bit integer, as used for list elements.
    pub fn read_zigzag64(&mut self) -> Result<i64, WireError> {
        let x = self.read_varint64()?;
        Ok(((x >> 1) as i64) ^ -((x & 1) as i64))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn read_float32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_float64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a timestamp payload. The nanosecond remainder is present only
    /// when the tag carried the variant flag.
    pub fn read_timestamp(&mut self, has_nanos: bool) -> Result<Timestamp, WireError> {
        let offset = self.index;
        let seconds = self.read_u64()? as i64;
        let nanos = if has_nanos { self.read_u32()? } else { 0 };
        Timestamp::new(seconds, nanos).ok_or(WireError::InvalidTimestamp { offset })
    }

    /// Reads a varint length or element count and rejects it when it exceeds
    /// `max`, before anything of that size is read or allocated.
    pub fn read_length(&mut self, max: usize, what: &str) -> Result<usize, WireError> {
        let len = self.read_varint32()? as usize;
        if len > max {
            return Err(WireError::LimitExceeded {
                what: what.to_owned(),
                len,
                max,
            });
        }
        Ok(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_text(&mut self, max: usize) -> Result<String, WireError> {
        let len = self.read_length(max, "text")?;
        let offset = self.index;
        let bytes = self.read_bytes(len)?;
        match str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => Err(WireError::InvalidUtf8 { offset }),
        }
    }

    /// Reads a length-prefixed byte string.
    pub fn read_binary(&mut self, max: usize) -> Result<Vec<u8>, WireError> {
        let len = self.read_length(max, "binary")?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Reads a list element boolean: exactly `0x00` or `0x01`.
    pub fn read_bool_element(&mut self) -> Result<bool, WireError> {
        let offset = self.index;
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(WireError::MalformedTag { byte, offset }),
        }
    }

    /// Reads a list element timestamp: seconds and nanoseconds, always both.
    pub fn read_timestamp_element(&mut self) -> Result<Timestamp, WireError> {
        self.read_timestamp(true)
    }
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(WireError::Truncated));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[0x7f]), Ok(0x7f));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(WireError::Truncated));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], 2), Err(WireError::Truncated));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert_eq!(bb.read_bytes(1), Err(WireError::Truncated));
}

#[test]
fn read_start() {
    assert_eq!(ByteBuffer::new(&[0x80]).read_start(), Ok(()));
    assert_eq!(
        ByteBuffer::new(&[0x7f]).read_start(),
        Err(WireError::MalformedTag { byte: 0x7f, offset: 0 })
    );
    assert_eq!(ByteBuffer::new(&[]).read_start(), Err(WireError::Truncated));
}

#[test]
fn read_start_bounds_nesting() {
    let data = [0x80; MAX_DEPTH + 1];
    let mut bb = ByteBuffer::new(&data);
    for _ in 0..MAX_DEPTH {
        assert_eq!(bb.read_start(), Ok(()));
    }
    assert_eq!(bb.depth(), MAX_DEPTH);
    assert_eq!(
        bb.read_start(),
        Err(WireError::LimitExceeded { what: "depth".to_owned(), len: MAX_DEPTH + 1, max: MAX_DEPTH })
    );

    // siblings close before the next one opens
    let mut bb = ByteBuffer::new(&data);
    for _ in 0..=MAX_DEPTH {
        assert_eq!(bb.read_start(), Ok(()));
        bb.close_struct();
    }
    assert_eq!(bb.depth(), 0);
}

#[test]
fn read_varint32() {
    let read = |bytes| ByteBuffer::new(bytes).read_varint32();
    assert_eq!(read(&[]), Err(WireError::Truncated));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[127]), Ok(127));
    assert_eq!(read(&[128]), Err(WireError::Truncated));
    assert_eq!(read(&[128, 1]), Ok(128));
    assert_eq!(read(&[129, 1]), Ok(129));
    assert_eq!(read(&[128, 2]), Ok(256));
    assert_eq!(read(&[255, 255, 255, 127]), Ok((1 << 28) - 1));
    assert_eq!(read(&[128, 128, 128, 128, 1]), Ok(1 << 28));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(u32::MAX));
}

#[test]
fn read_varint64() {
    let read = |bytes| ByteBuffer::new(bytes).read_varint64();
    assert_eq!(read(&[]), Err(WireError::Truncated));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[127]), Ok(127));
    assert_eq!(read(&[128, 1]), Ok(128));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(4294967295));
    assert_eq!(
        read(&[0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x10]),
        Ok(0x1000_0000_0000_0001)
    );
    assert_eq!(
        read(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]),
        Ok(0x7FFF_FFFF_FFFF_FFFF)
    );
    assert_eq!(
        read(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]),
        Ok(0x8000_0000_0000_0000)
    );
    assert_eq!(
        read(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        Ok(0xFFFF_FFFF_FFFF_FFFF)
    );
}

#[test]
fn read_negated() {
    assert_eq!(ByteBuffer::new(&[5]).read_negated32(), Ok(-5));
    assert_eq!(
        ByteBuffer::new(&[128, 128, 128, 128, 8]).read_negated32(),
        Ok(i32::MIN)
    );
    assert_eq!(
        ByteBuffer::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]).read_negated64(),
        Ok(i64::MIN)
    );
}

#[test]
fn read_signed_magnitude_range() {
    assert_eq!(ByteBuffer::new(&[255, 255, 255, 255, 7]).read_positive32(), Ok(i32::MAX));
    assert_eq!(
        ByteBuffer::new(&[128, 128, 128, 128, 8]).read_positive32(),
        Err(WireError::IntegerOverflow { offset: 0 })
    );
    assert_eq!(
        ByteBuffer::new(&[129, 128, 128, 128, 8]).read_negated32(),
        Err(WireError::IntegerOverflow { offset: 0 })
    );
    assert_eq!(
        ByteBuffer::new(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]).read_positive64(),
        Ok(i64::MAX)
    );
    assert_eq!(
        ByteBuffer::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]).read_positive64(),
        Err(WireError::IntegerOverflow { offset: 0 })
    );
    assert_eq!(
        ByteBuffer::new(&[0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]).read_negated64(),
        Err(WireError::IntegerOverflow { offset: 0 })
    );
}

#[test]
fn read_zigzag() {
    let read = |bytes| ByteBuffer::new(bytes).read_zigzag32();
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(-1));
    assert_eq!(read(&[2]), Ok(1));
    assert_eq!(read(&[127]), Ok(-64));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(i32::MIN));
    assert_eq!(
        ByteBuffer::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).read_zigzag64(),
        Ok(i64::MIN)
    );
}

#[test]
fn read_fixed() {
    assert_eq!(ByteBuffer::new(&[0x3f, 0x80, 0, 0]).read_float32(), Ok(1.0));
    assert_eq!(
        ByteBuffer::new(&[0xc0, 0, 0, 0, 0, 0, 0, 0]).read_float64(),
        Ok(-2.0)
    );
    assert_eq!(ByteBuffer::new(&[0x3f, 0x80]).read_float32(), Err(WireError::Truncated));
}

#[test]
fn read_timestamp() {
    let mut bb = ByteBuffer::new(&[0, 0, 0, 0, 0x5f, 0x5e, 0x10, 0x00]);
    assert_eq!(bb.read_timestamp(false), Ok(Timestamp::new(0x5f5e1000, 0).unwrap()));

    let mut bb = ByteBuffer::new(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 7]);
    assert_eq!(bb.read_timestamp(true), Ok(Timestamp::new(1, 7).unwrap()));

    let mut bb = ByteBuffer::new(&[0, 0, 0, 0, 0, 0, 0, 1, 0x3b, 0x9a, 0xca, 0x00]);
    assert_eq!(bb.read_timestamp(true), Err(WireError::InvalidTimestamp { offset: 0 }));
}

#[test]
fn read_text() {
    let read = |bytes| ByteBuffer::new(bytes).read_text(8);
    assert_eq!(read(&[0]), Ok(String::new()));
    assert_eq!(read(&[1, 97]), Ok("a".to_owned()));
    assert_eq!(read(&[4, 240, 159, 141, 149]), Ok("🍕".to_owned()));
    assert_eq!(read(&[3, 97]), Err(WireError::Truncated));
    assert_eq!(read(&[2, 0xc3, 0x28]), Err(WireError::InvalidUtf8 { offset: 1 }));
    assert_eq!(
        read(&[9, 97, 97, 97, 97, 97, 97, 97, 97, 97]),
        Err(WireError::LimitExceeded { what: "text".to_owned(), len: 9, max: 8 })
    );
}

#[test]
fn read_length_rejects_before_reading() {
    // declared count far beyond the data: the limit check fires first
    let mut bb = ByteBuffer::new(&[0xff, 0xff, 0xff, 0xff, 0x0f]);
    assert_eq!(
        bb.read_length(1024, "items"),
        Err(WireError::LimitExceeded {
            what: "items".to_owned(),
            len: u32::MAX as usize,
            max: 1024
        })
    );
}

#[test]
fn read_bool_element() {
    let read = |bytes| ByteBuffer::new(bytes).read_bool_element();
    assert_eq!(read(&[0]), Ok(false));
    assert_eq!(read(&[1]), Ok(true));
    assert_eq!(read(&[2]), Err(WireError::MalformedTag { byte: 2, offset: 0 }));
}

/// A Colf byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_colf_schema::ByteBufferMut::new();
/// bb.write_byte(0x80).unwrap();
/// bb.write_signed32(2, -5).unwrap();
/// assert_eq!(bb.data(), [0x80, 0x82, 0x05]);
/// ```
///
pub struct ByteBufferMut {
    data: Vec<u8>,
    max: usize,
}

impl Default for ByteBufferMut {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing, without a size limit.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut::with_limit(usize::MAX)
    }

    /// Creates an empty ByteBufferMut that refuses to grow past `max` bytes.
    pub fn with_limit(max: usize) -> ByteBufferMut {
        ByteBufferMut { data: vec![], max }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The size limit this buffer enforces.
    pub fn limit(&self) -> usize {
        self.max
    }

    fn reserve(&self, n: usize) -> Result<(), WireError> {
        let size = self.data.len().saturating_add(n);
        if size > self.max {
            return Err(WireError::Overflow { size, max: self.max });
        }
        Ok(())
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) -> Result<(), WireError> {
        self.reserve(1)?;
        self.data.push(value);
        Ok(())
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), WireError> {
        self.reserve(value.len())?;
        self.data.extend_from_slice(value);
        Ok(())
    }

    /// Write an unsigned 32-bit varint: at most five bytes.
    pub fn write_varint32(&mut self, mut value: u32) -> Result<(), WireError> {
        while value > 0x7f {
            self.write_byte(value as u8 | 0x80)?;
            value >>= 7;
        }
        self.write_byte(value as u8)
    }

    /// Write an unsigned 64-bit varint: at most nine bytes, where the ninth
    /// byte holds the top eight bits without a continuation flag.
    pub fn write_varint64(&mut self, mut value: u64) -> Result<(), WireError> {
        let mut i = 0;
        while value > 0x7f && i < 8 {
            self.write_byte(value as u8 | 0x80)?;
            value >>= 7;
            i += 1;
        }
        self.write_byte(value as u8)
    }

    /// Writes a signed 32-bit field entry. Negative values set the variant
    /// flag on the tag and carry their magnitude.
    pub fn write_signed32(&mut self, index: u8, value: i32) -> Result<(), WireError> {
        if value < 0 {
            self.write_byte(index | FLAG)?;
        } else {
            self.write_byte(index)?;
        }
        self.write_varint32(value.unsigned_abs())
    }

    /// Writes a signed 64-bit field entry. Negative values set the variant
    /// flag on the tag and carry their magnitude.
    pub fn write_signed64(&mut self, index: u8, value: i64) -> Result<(), WireError> {
        if value < 0 {
            self.write_byte(index | FLAG)?;
        } else {
            self.write_byte(index)?;
        }
        self.write_varint64(value.unsigned_abs())
    }

    pub fn write_zigzag32(&mut self, value: i32) -> Result<(), WireError> {
        self.write_varint32(((value << 1) ^ (value >> 31)) as u32)
    }

    pub fn write_zigzag64(&mut self, value: i64) -> Result<(), WireError> {
        self.write_varint64(((value << 1) ^ (value >> 63)) as u64)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_float32(&mut self, value: f32) -> Result<(), WireError> {
        self.write_u32(value.to_bits())
    }

    pub fn write_float64(&mut self, value: f64) -> Result<(), WireError> {
        self.write_u64(value.to_bits())
    }

    /// Writes a timestamp field entry. The variant flag marks the presence of
    /// the nanosecond remainder.
    pub fn write_timestamp(&mut self, index: u8, value: &Timestamp) -> Result<(), WireError> {
        if value.nanos() == 0 {
            self.write_byte(index)?;
            self.write_u64(value.seconds() as u64)
        } else {
            self.write_byte(index | FLAG)?;
            self.write_u64(value.seconds() as u64)?;
            self.write_u32(value.nanos())
        }
    }

    /// Writes a list element timestamp: seconds and nanoseconds, always both.
    pub fn write_timestamp_element(&mut self, value: &Timestamp) -> Result<(), WireError> {
        self.write_u64(value.seconds() as u64)?;
        self.write_u32(value.nanos())
    }

    pub fn write_bool_element(&mut self, value: bool) -> Result<(), WireError> {
        self.write_byte(value as u8)
    }

    /// Writes a varint length followed by the raw bytes.
    pub fn write_binary(&mut self, value: &[u8]) -> Result<(), WireError> {
        self.write_varint32(value.len() as u32)?;
        self.write_bytes(value)
    }

    /// Writes the UTF-8 byte length followed by the string bytes.
    pub fn write_text(&mut self, value: &str) -> Result<(), WireError> {
        self.write_binary(value.as_bytes())
    }

    /// Writes a list field header: the tag and the element count. Fails when
    /// the count exceeds `max`.
    pub fn write_list_header(
        &mut self,
        index: u8,
        len: usize,
        max: usize,
        what: &str,
    ) -> Result<(), WireError> {
        if len > max {
            return Err(WireError::LimitExceeded {
                what: what.to_owned(),
                len,
                max,
            });
        }
        self.write_byte(index)?;
        self.write_varint32(len as u32)
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut) -> Result<(), WireError>) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb).unwrap();
    bb.data()
}

#[test]
fn write_varint32() {
    assert_eq!(write_once(|bb| bb.write_varint32(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_varint32(127)), [127]);
    assert_eq!(write_once(|bb| bb.write_varint32(128)), [128, 1]);
    assert_eq!(write_once(|bb| bb.write_varint32(256)), [128, 2]);
    assert_eq!(write_once(|bb| bb.write_varint32((1 << 28) - 1)), [255, 255, 255, 127]);
    assert_eq!(write_once(|bb| bb.write_varint32(1 << 28)), [128, 128, 128, 128, 1]);
    assert_eq!(write_once(|bb| bb.write_varint32(u32::MAX)), [255, 255, 255, 255, 15]);
}

#[test]
fn write_varint64() {
    assert_eq!(write_once(|bb| bb.write_varint64(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_varint64(128)), [128, 1]);
    assert_eq!(
        write_once(|bb| bb.write_varint64(0x1000_0000_0000_0001)),
        [0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x10]
    );
    assert_eq!(
        write_once(|bb| bb.write_varint64(0x7FFF_FFFF_FFFF_FFFF)),
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]
    );
    assert_eq!(
        write_once(|bb| bb.write_varint64(0x8000_0000_0000_0000)),
        [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]
    );
    assert_eq!(
        write_once(|bb| bb.write_varint64(u64::MAX)),
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn write_signed() {
    assert_eq!(write_once(|bb| bb.write_signed32(3, 5)), [0x03, 5]);
    assert_eq!(write_once(|bb| bb.write_signed32(3, -5)), [0x83, 5]);
    assert_eq!(
        write_once(|bb| bb.write_signed32(0, i32::MIN)),
        [0x80, 128, 128, 128, 128, 8]
    );
    assert_eq!(
        write_once(|bb| bb.write_signed64(1, i64::MIN)),
        [0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]
    );
}

#[test]
fn write_zigzag() {
    assert_eq!(write_once(|bb| bb.write_zigzag32(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_zigzag32(-1)), [1]);
    assert_eq!(write_once(|bb| bb.write_zigzag32(1)), [2]);
    assert_eq!(write_once(|bb| bb.write_zigzag32(64)), [128, 1]);
    assert_eq!(write_once(|bb| bb.write_zigzag32(i32::MIN)), [255, 255, 255, 255, 15]);
    assert_eq!(
        write_once(|bb| bb.write_zigzag64(i64::MIN)),
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn write_fixed() {
    assert_eq!(write_once(|bb| bb.write_float32(1.0)), [0x3f, 0x80, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_float64(-2.0)), [0xc0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn write_timestamp() {
    assert_eq!(
        write_once(|bb| bb.write_timestamp(2, &Timestamp::new(1, 0).unwrap())),
        [0x02, 0, 0, 0, 0, 0, 0, 0, 1]
    );
    assert_eq!(
        write_once(|bb| bb.write_timestamp(2, &Timestamp::new(1, 7).unwrap())),
        [0x82, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 7]
    );
}

#[test]
fn write_text() {
    assert_eq!(write_once(|bb| bb.write_text("")), [0]);
    assert_eq!(write_once(|bb| bb.write_text("abc")), [3, 97, 98, 99]);
    assert_eq!(write_once(|bb| bb.write_text("🍕")), [4, 240, 159, 141, 149]);
}

#[test]
fn write_limit() {
    let mut bb = ByteBufferMut::with_limit(3);
    assert_eq!(bb.write_bytes(&[1, 2]), Ok(()));
    assert_eq!(bb.write_bytes(&[3, 4]), Err(WireError::Overflow { size: 4, max: 3 }));
    assert_eq!(bb.write_byte(3), Ok(()));
    assert_eq!(bb.write_byte(4), Err(WireError::Overflow { size: 4, max: 3 }));
    assert_eq!(bb.data(), [1, 2, 3]);
}

#[test]
fn write_list_header() {
    let mut bb = ByteBufferMut::new();
    assert_eq!(
        bb.write_list_header(4, 3, 2, "names"),
        Err(WireError::LimitExceeded { what: "names".to_owned(), len: 3, max: 2 })
    );
    assert!(bb.is_empty());
    assert_eq!(bb.write_list_header(4, 2, 2, "names"), Ok(()));
    assert_eq!(bb.data(), [4, 2]);
}
