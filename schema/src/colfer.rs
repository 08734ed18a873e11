use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::WireError,
};

/// Implemented by every generated struct.
///
/// `encode` and `decode` handle one envelope (start marker, field entries,
/// end marker) at the current buffer position and are what nested struct
/// fields call. The provided methods add the top-level size limit.
pub trait Colfer: Sized {
    /// Upper limit for serial byte sizes, from the package `SizeMax`.
    const SIZE_MAX: usize;
    /// Upper limit for the number of elements in a list, from `ListMax`.
    const LIST_MAX: usize;

    fn encode(&self, bb: &mut ByteBufferMut) -> Result<(), WireError>;

    fn decode(bb: &mut ByteBuffer<'_>) -> Result<Self, WireError>;

    /// Serializes into a new vector, failing with `Overflow` past `SIZE_MAX`.
    fn marshal(&self) -> Result<Vec<u8>, WireError> {
        let mut bb = ByteBufferMut::with_limit(Self::SIZE_MAX);
        self.encode(&mut bb)?;
        Ok(bb.data())
    }

    /// Serializes into `out` and returns the number of bytes written. Fails
    /// with `Overflow` when `out` or `SIZE_MAX` is too small.
    fn marshal_to(&self, out: &mut [u8]) -> Result<usize, WireError> {
        let mut bb = ByteBufferMut::with_limit(Self::SIZE_MAX.min(out.len()));
        self.encode(&mut bb)?;
        let data = bb.data();
        out[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    /// Deserializes one struct from the start of `data` and returns it with
    /// the number of bytes consumed. Data past `SIZE_MAX` is never read.
    fn unmarshal(data: &[u8]) -> Result<(Self, usize), WireError> {
        let view = &data[..data.len().min(Self::SIZE_MAX)];
        let mut bb = ByteBuffer::new(view);
        match Self::decode(&mut bb) {
            Ok(v) => Ok((v, bb.index())),
            Err(WireError::Truncated) if data.len() > Self::SIZE_MAX => {
                Err(WireError::LimitExceeded {
                    what: "serial".to_owned(),
                    len: data.len(),
                    max: Self::SIZE_MAX,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::END;

    // Hand-written equivalent of a generated struct with one `text` field at
    // index 0 and one `[]uint32` field at index 1.
    #[derive(Debug, Default, PartialEq)]
    struct Note {
        title: String,
        marks: Vec<u32>,
    }

    impl Colfer for Note {
        const SIZE_MAX: usize = 12;
        const LIST_MAX: usize = 3;

        fn encode(&self, bb: &mut ByteBufferMut) -> Result<(), WireError> {
            bb.write_byte(crate::START)?;
            if !self.title.is_empty() {
                bb.write_byte(0)?;
                bb.write_text(&self.title)?;
            }
            if !self.marks.is_empty() {
                bb.write_list_header(1, self.marks.len(), Self::LIST_MAX, "marks")?;
                for x in &self.marks {
                    bb.write_varint32(*x)?;
                }
            }
            bb.write_byte(END)
        }

        fn decode(bb: &mut ByteBuffer<'_>) -> Result<Self, WireError> {
            bb.read_start()?;
            let mut o = Self::default();
            loop {
                let offset = bb.index();
                match bb.read_byte()? {
                    END => {
                        bb.close_struct();
                        return Ok(o);
                    }
                    0 => o.title = bb.read_text(Self::SIZE_MAX)?,
                    1 => {
                        let n = bb.read_length(Self::LIST_MAX, "marks")?;
                        let mut v = Vec::with_capacity(n);
                        for _ in 0..n {
                            v.push(bb.read_varint32()?);
                        }
                        o.marks = v;
                    }
                    byte => return Err(WireError::MalformedTag { byte, offset }),
                }
            }
        }
    }

    #[test]
    fn zero_value_is_an_empty_envelope() {
        assert_eq!(Note::default().marshal(), Ok(vec![0x80, 0x7f]));
        assert_eq!(Note::unmarshal(&[0x80, 0x7f]), Ok((Note::default(), 2)));
    }

    #[test]
    fn round_trip() {
        let note = Note { title: "hi".to_owned(), marks: vec![1, 300] };
        let data = note.marshal().unwrap();
        assert_eq!(data, [0x80, 0, 2, b'h', b'i', 1, 2, 1, 0xac, 0x02, 0x7f]);
        assert_eq!(Note::unmarshal(&data), Ok((note, data.len())));
    }

    #[test]
    fn size_limit() {
        let note = Note { title: "0123456789".to_owned(), marks: vec![] };
        assert_eq!(note.marshal(), Err(WireError::Overflow { size: 13, max: 12 }));

        let mut out = [0u8; 4];
        let small = Note { title: "abc".to_owned(), marks: vec![] };
        assert_eq!(small.marshal_to(&mut out), Err(WireError::Overflow { size: 6, max: 4 }));
        let mut out = [0u8; 8];
        assert_eq!(small.marshal_to(&mut out), Ok(7));
    }

    #[test]
    fn list_limit() {
        let note = Note { title: String::new(), marks: vec![1, 2, 3, 4] };
        assert_eq!(
            note.marshal(),
            Err(WireError::LimitExceeded { what: "marks".to_owned(), len: 4, max: 3 })
        );
        assert_eq!(
            Note::unmarshal(&[0x80, 1, 0x7f, 0x7f]),
            Err(WireError::LimitExceeded { what: "marks".to_owned(), len: 127, max: 3 })
        );
    }

    #[test]
    fn malformed() {
        assert_eq!(
            Note::unmarshal(&[0x7f]),
            Err(WireError::MalformedTag { byte: 0x7f, offset: 0 })
        );
        assert_eq!(Note::unmarshal(&[0x80, 0, 1, b'a']), Err(WireError::Truncated));
        assert_eq!(
            Note::unmarshal(&[0x80, 5, 0x7f]),
            Err(WireError::MalformedTag { byte: 5, offset: 1 })
        );
    }

    #[test]
    fn oversized_input_is_not_read_past_the_limit() {
        let mut data = vec![0x80, 0, 20];
        data.extend_from_slice(&[b'x'; 20]);
        data.push(0x7f);
        assert_eq!(
            Note::unmarshal(&data),
            Err(WireError::LimitExceeded { what: "text".to_owned(), len: 20, max: 12 })
        );
    }
}
