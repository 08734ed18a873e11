//! Reference codec: encodes and decodes dynamic values against the resolved
//! IR with the same rules every backend generates code for. Backend tests
//! compare generated marshal output with this codec byte for byte.

use std::collections::BTreeMap;

use brine_colf_schema::{ByteBuffer, ByteBufferMut, Timestamp, WireError, END, FLAG, START};
use thiserror::Error;

use crate::ir::{Field, Primitive, Schema, StructId, TypeKind, VariantFlag, WireRule};

/// This type holds dynamic Colf data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint32(u32),
    Uint64(u64),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Timestamp(Timestamp),
    Text(String),
    Binary(Vec<u8>),
    /// A struct reference, `None` when absent.
    Struct(Option<Box<StructValue>>),
    List(Vec<Value>),
}

impl Value {
    /// Zero values are omitted from the wire.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(v) => !v,
            Value::Uint32(v) => *v == 0,
            Value::Uint64(v) => *v == 0,
            Value::Int32(v) => *v == 0,
            Value::Int64(v) => *v == 0,
            Value::Float32(v) => *v == 0.0,
            Value::Float64(v) => *v == 0.0,
            Value::Timestamp(v) => v.is_zero(),
            Value::Text(v) => v.is_empty(),
            Value::Binary(v) => v.is_empty(),
            Value::Struct(v) => v.is_none(),
            Value::List(v) => v.is_empty(),
        }
    }

    pub fn struct_(v: StructValue) -> Value {
        Value::Struct(Some(Box::new(v)))
    }
}

/// A struct instance. Fields not in the map hold their zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_id: StructId,
    pub fields:  BTreeMap<String, Value>,
}

impl StructValue {
    pub fn new(type_id: StructId) -> StructValue {
        StructValue { type_id, fields: BTreeMap::new() }
    }

    pub fn with(mut self, name: &str, value: Value) -> StructValue {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Drops zero-valued fields, recursively, which is what a decode of the
    /// encoding yields.
    pub fn normalized(&self) -> StructValue {
        fn norm(v: &Value) -> Value {
            match v {
                Value::Struct(Some(s)) => Value::struct_(s.normalized()),
                Value::List(items) => Value::List(items.iter().map(norm).collect()),
                other => other.clone(),
            }
        }
        StructValue {
            type_id: self.type_id,
            fields: self
                .fields
                .iter()
                .filter(|(_, v)| !v.is_zero())
                .map(|(k, v)| (k.clone(), norm(v)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("struct {struct_:?} has no field {field:?}")]
    UnknownField { struct_: String, field: String },

    #[error("field {field:?} expects {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("list field {field:?} holds a null struct")]
    NullElement { field: String },

    #[error("{which} of package {package:?} is not a constant expression")]
    Limit { package: String, which: &'static str },
}

struct Limits {
    size_max: usize,
    list_max: usize,
}

fn limits(schema: &Schema, id: StructId) -> Result<Limits, ValueError> {
    let pkg = schema.package_of(id);
    let size_max = pkg.size_max.evaluate_usize().ok_or_else(|| ValueError::Limit {
        package: pkg.name.clone(),
        which: "size limit",
    })?;
    let list_max = pkg.list_max.evaluate_usize().ok_or_else(|| ValueError::Limit {
        package: pkg.name.clone(),
        which: "list limit",
    })?;
    Ok(Limits { size_max, list_max })
}

/// Serializes `value`, failing with `Overflow` past the package size limit.
pub fn encode(schema: &Schema, value: &StructValue) -> Result<Vec<u8>, ValueError> {
    let mut bb = ByteBufferMut::with_limit(limits(schema, value.type_id)?.size_max);
    encode_struct(schema, value, &mut bb)?;
    Ok(bb.data())
}

fn encode_struct(schema: &Schema, value: &StructValue, bb: &mut ByteBufferMut) -> Result<(), ValueError> {
    let def = schema.struct_(value.type_id);
    if let Some(name) = value.fields.keys().find(|k| def.field(k).is_none()) {
        return Err(ValueError::UnknownField {
            struct_: def.name.clone(),
            field: name.clone(),
        });
    }
    let list_max = limits(schema, value.type_id)?.list_max;

    bb.write_byte(START)?;
    for field in &def.fields {
        match value.get(&field.name) {
            Some(v) if !v.is_zero() => encode_field(schema, field, v, list_max, bb)?,
            _ => {}
        }
    }
    bb.write_byte(END)?;
    Ok(())
}

fn mismatch(field: &Field, expected: &str) -> ValueError {
    ValueError::TypeMismatch {
        field: field.name.clone(),
        expected: expected.to_string(),
    }
}

fn encode_field(
    schema: &Schema,
    field: &Field,
    value: &Value,
    list_max: usize,
    bb: &mut ByteBufferMut,
) -> Result<(), ValueError> {
    let idx = field.index;
    match (field.ty.rule(), value) {
        (WireRule::Presence, Value::Bool(_)) => bb.write_byte(idx)?,
        (WireRule::Varint32, Value::Uint32(x)) => {
            bb.write_byte(idx)?;
            bb.write_varint32(*x)?;
        }
        (WireRule::Varint64, Value::Uint64(x)) => {
            bb.write_byte(idx)?;
            bb.write_varint64(*x)?;
        }
        (WireRule::Signed32, Value::Int32(x)) => bb.write_signed32(idx, *x)?,
        (WireRule::Signed64, Value::Int64(x)) => bb.write_signed64(idx, *x)?,
        (WireRule::Fixed32, Value::Float32(x)) => {
            bb.write_byte(idx)?;
            bb.write_float32(*x)?;
        }
        (WireRule::Fixed64, Value::Float64(x)) => {
            bb.write_byte(idx)?;
            bb.write_float64(*x)?;
        }
        (WireRule::Timestamp, Value::Timestamp(t)) => bb.write_timestamp(idx, t)?,
        (WireRule::Text, Value::Text(s)) => {
            bb.write_byte(idx)?;
            bb.write_text(s)?;
        }
        (WireRule::Binary, Value::Binary(b)) => {
            bb.write_byte(idx)?;
            bb.write_binary(b)?;
        }
        (WireRule::Nested, Value::Struct(Some(s))) => {
            check_struct_type(field, s)?;
            bb.write_byte(idx)?;
            encode_struct(schema, s, bb)?;
        }
        (WireRule::List, Value::List(items)) => {
            bb.write_list_header(idx, items.len(), list_max, &field.name)?;
            for item in items {
                encode_element(schema, field, item, bb)?;
            }
        }
        _ => return Err(mismatch(field, &type_label(schema, field))),
    }
    Ok(())
}

fn encode_element(
    schema: &Schema,
    field: &Field,
    item: &Value,
    bb: &mut ByteBufferMut,
) -> Result<(), ValueError> {
    match (field.ty.kind, item) {
        (TypeKind::Primitive(Primitive::Bool), Value::Bool(b)) => bb.write_bool_element(*b)?,
        (TypeKind::Primitive(Primitive::Uint32), Value::Uint32(x)) => bb.write_varint32(*x)?,
        (TypeKind::Primitive(Primitive::Uint64), Value::Uint64(x)) => bb.write_varint64(*x)?,
        (TypeKind::Primitive(Primitive::Int32), Value::Int32(x)) => bb.write_zigzag32(*x)?,
        (TypeKind::Primitive(Primitive::Int64), Value::Int64(x)) => bb.write_zigzag64(*x)?,
        (TypeKind::Primitive(Primitive::Float32), Value::Float32(x)) => bb.write_float32(*x)?,
        (TypeKind::Primitive(Primitive::Float64), Value::Float64(x)) => bb.write_float64(*x)?,
        (TypeKind::Primitive(Primitive::Timestamp), Value::Timestamp(t)) => bb.write_timestamp_element(t)?,
        (TypeKind::Primitive(Primitive::Text), Value::Text(s)) => bb.write_text(s)?,
        (TypeKind::Primitive(Primitive::Binary), Value::Binary(b)) => bb.write_binary(b)?,
        (TypeKind::Struct(_), Value::Struct(Some(s))) => {
            check_struct_type(field, s)?;
            encode_struct(schema, s, bb)?;
        }
        (TypeKind::Struct(_), Value::Struct(None)) => {
            return Err(ValueError::NullElement { field: field.name.clone() })
        }
        _ => return Err(mismatch(field, &type_label(schema, field))),
    }
    Ok(())
}

fn check_struct_type(field: &Field, s: &StructValue) -> Result<(), ValueError> {
    match field.ty.kind {
        TypeKind::Struct(id) if id == s.type_id => Ok(()),
        _ => Err(mismatch(field, "a different struct type")),
    }
}

fn type_label(schema: &Schema, field: &Field) -> String {
    let elem = match field.ty.kind {
        TypeKind::Primitive(p) => p.name().to_string(),
        TypeKind::Struct(id) => schema.struct_(id).name.clone(),
    };
    if field.ty.list {
        format!("[]{}", elem)
    } else {
        elem
    }
}

/// Deserializes one `type_id` from the start of `data` and returns it with
/// the number of bytes consumed.
pub fn decode(schema: &Schema, type_id: StructId, data: &[u8]) -> Result<(StructValue, usize), ValueError> {
    let size_max = limits(schema, type_id)?.size_max;
    let view = &data[..data.len().min(size_max)];
    let mut bb = ByteBuffer::new(view);
    match decode_struct(schema, type_id, &mut bb) {
        Ok(v) => Ok((v, bb.index())),
        Err(ValueError::Wire(WireError::Truncated)) if data.len() > size_max => {
            Err(ValueError::Wire(WireError::LimitExceeded {
                what: "serial".to_string(),
                len: data.len(),
                max: size_max,
            }))
        }
        Err(e) => Err(e),
    }
}

fn decode_struct(schema: &Schema, type_id: StructId, bb: &mut ByteBuffer<'_>) -> Result<StructValue, ValueError> {
    let def = schema.struct_(type_id);
    let lim = limits(schema, type_id)?;
    let mut out = StructValue::new(type_id);

    bb.read_start()?;
    loop {
        let offset = bb.index();
        let tag = bb.read_byte()?;
        if tag == END {
            bb.close_struct();
            return Ok(out);
        }
        let flagged = tag & FLAG != 0;
        let field = def
            .fields
            .iter()
            .find(|f| f.index == tag & !FLAG)
            .filter(|f| !flagged || f.ty.rule().variant_flag() != VariantFlag::Unused)
            .ok_or(WireError::MalformedTag { byte: tag, offset })?;

        let value = match field.ty.rule() {
            WireRule::Presence => Value::Bool(true),
            WireRule::Varint32 => Value::Uint32(bb.read_varint32()?),
            WireRule::Varint64 => Value::Uint64(bb.read_varint64()?),
            WireRule::Signed32 if flagged => Value::Int32(bb.read_negated32()?),
            WireRule::Signed32 => Value::Int32(bb.read_positive32()?),
            WireRule::Signed64 if flagged => Value::Int64(bb.read_negated64()?),
            WireRule::Signed64 => Value::Int64(bb.read_positive64()?),
            WireRule::Fixed32 => Value::Float32(bb.read_float32()?),
            WireRule::Fixed64 => Value::Float64(bb.read_float64()?),
            WireRule::Timestamp => Value::Timestamp(bb.read_timestamp(flagged)?),
            WireRule::Text => Value::Text(bb.read_text(lim.size_max)?),
            WireRule::Binary => Value::Binary(bb.read_binary(lim.size_max)?),
            WireRule::Nested => decode_element(schema, field.ty.kind, lim.size_max, bb)?,
            WireRule::List => {
                let n = bb.read_length(lim.list_max, &field.name)?;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(decode_element(schema, field.ty.kind, lim.size_max, bb)?);
                }
                Value::List(items)
            }
        };
        out.fields.insert(field.name.clone(), value);
    }
}

fn decode_element(
    schema: &Schema,
    kind: TypeKind,
    size_max: usize,
    bb: &mut ByteBuffer<'_>,
) -> Result<Value, ValueError> {
    Ok(match kind {
        TypeKind::Primitive(p) => match p {
            Primitive::Bool      => Value::Bool(bb.read_bool_element()?),
            Primitive::Uint32    => Value::Uint32(bb.read_varint32()?),
            Primitive::Uint64    => Value::Uint64(bb.read_varint64()?),
            Primitive::Int32     => Value::Int32(bb.read_zigzag32()?),
            Primitive::Int64     => Value::Int64(bb.read_zigzag64()?),
            Primitive::Float32   => Value::Float32(bb.read_float32()?),
            Primitive::Float64   => Value::Float64(bb.read_float64()?),
            Primitive::Timestamp => Value::Timestamp(bb.read_timestamp_element()?),
            Primitive::Text      => Value::Text(bb.read_text(size_max)?),
            Primitive::Binary    => Value::Binary(bb.read_binary(size_max)?),
        },
        TypeKind::Struct(id) => Value::struct_(decode_struct(schema, id, bb)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CompileConfig, parser::parse_sources, resolver::resolve};
    use brine_colf_schema::MAX_DEPTH;

    const DEMO: &str = "package demo
struct point {
    flag bool;
    count uint32;
    big uint64;
    delta int32;
    offset int64;
    ratio float32;
    weight float64;
    at timestamp;
    label text;
    blob binary;
    next point;
    tags []text;
    steps []int32;
    checks []bool;
    stamps []timestamp;
    kids []point;
}
";

    fn schema_of(text: &str, config: CompileConfig) -> Schema {
        resolve(&parse_sources(&[("demo.colf", text)]).unwrap(), &config).unwrap()
    }

    fn demo() -> Schema {
        schema_of(DEMO, CompileConfig::default())
    }

    fn point() -> StructValue {
        StructValue::new(StructId(0))
    }

    #[test]
    fn empty_struct_is_two_bytes() {
        let schema = demo();
        assert_eq!(encode(&schema, &point()).unwrap(), [0x80, 0x7f]);
        let zeros = point()
            .with("flag", Value::Bool(false))
            .with("count", Value::Uint32(0))
            .with("label", Value::Text(String::new()))
            .with("tags", Value::List(vec![]))
            .with("next", Value::Struct(None));
        assert_eq!(encode(&schema, &zeros).unwrap(), [0x80, 0x7f]);
    }

    #[test]
    fn primitive_fields() {
        let schema = demo();
        let v = point()
            .with("flag", Value::Bool(true))
            .with("count", Value::Uint32(300))
            .with("delta", Value::Int32(-5))
            .with("label", Value::Text("hi".into()));
        assert_eq!(
            encode(&schema, &v).unwrap(),
            [0x80, 0x00, 0x01, 0xac, 0x02, 0x83, 0x05, 0x08, 0x02, b'h', b'i', 0x7f]
        );
    }

    #[test]
    fn int64_min_uses_nine_byte_varint() {
        let schema = demo();
        let v = point().with("offset", Value::Int64(i64::MIN));
        let bytes = encode(&schema, &v).unwrap();
        assert_eq!(
            bytes,
            [0x80, 0x84, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f]
        );
        assert_eq!(decode(&schema, StructId(0), &bytes).unwrap(), (v, bytes.len()));
    }

    #[test]
    fn timestamp_flag_marks_nanos() {
        let schema = demo();
        let whole = point().with("at", Value::Timestamp(Timestamp::from_seconds(1)));
        assert_eq!(
            encode(&schema, &whole).unwrap(),
            [0x80, 0x07, 0, 0, 0, 0, 0, 0, 0, 1, 0x7f]
        );
        let split = point().with("at", Value::Timestamp(Timestamp::new(1, 2).unwrap()));
        assert_eq!(
            encode(&schema, &split).unwrap(),
            [0x80, 0x87, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 2, 0x7f]
        );
    }

    #[test]
    fn list_elements() {
        let schema = demo();
        let v = point()
            .with("steps", Value::List(vec![Value::Int32(-1), Value::Int32(1)]))
            .with("checks", Value::List(vec![Value::Bool(true), Value::Bool(false)]));
        assert_eq!(
            encode(&schema, &v).unwrap(),
            [0x80, 0x0c, 0x02, 0x01, 0x02, 0x0d, 0x02, 0x01, 0x00, 0x7f]
        );
    }

    #[test]
    fn round_trip_everything() {
        let schema = demo();
        let child = point().with("label", Value::Text("child".into()));
        let v = point()
            .with("flag", Value::Bool(true))
            .with("count", Value::Uint32(u32::MAX))
            .with("big", Value::Uint64(u64::MAX))
            .with("delta", Value::Int32(i32::MIN))
            .with("offset", Value::Int64(42))
            .with("ratio", Value::Float32(1.5))
            .with("weight", Value::Float64(-0.25))
            .with("at", Value::Timestamp(Timestamp::new(-1, 999_999_999).unwrap()))
            .with("label", Value::Text("héllo".into()))
            .with("blob", Value::Binary(vec![0, 1, 2]))
            .with("next", Value::struct_(child.clone()))
            .with("tags", Value::List(vec![Value::Text("a".into()), Value::Text(String::new())]))
            .with("stamps", Value::List(vec![Value::Timestamp(Timestamp::from_seconds(0))]))
            .with("kids", Value::List(vec![Value::struct_(child), Value::struct_(point())]));
        let bytes = encode(&schema, &v).unwrap();
        let (back, n) = decode(&schema, StructId(0), &bytes).unwrap();
        assert_eq!(n, bytes.len());
        assert_eq!(back, v.normalized());
    }

    #[test]
    fn decode_reports_consumed_length() {
        let schema = demo();
        let (v, n) = decode(&schema, StructId(0), &[0x80, 0x00, 0x7f, 0xff, 0xff]).unwrap();
        assert_eq!(n, 3);
        assert_eq!(v.get("flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn malformed_streams() {
        let schema = demo();
        let err = |data: &[u8]| decode(&schema, StructId(0), data).unwrap_err();
        assert_eq!(
            err(&[0x7f]),
            ValueError::Wire(WireError::MalformedTag { byte: 0x7f, offset: 0 })
        );
        assert_eq!(err(&[0x80, 0x00]), ValueError::Wire(WireError::Truncated));
        // bool has no variant
        assert_eq!(
            err(&[0x80, 0x80, 0x7f]),
            ValueError::Wire(WireError::MalformedTag { byte: 0x80, offset: 1 })
        );
        // no field 20
        assert_eq!(
            err(&[0x80, 0x14, 0x7f]),
            ValueError::Wire(WireError::MalformedTag { byte: 0x14, offset: 1 })
        );
        assert_eq!(
            err(&[0x80, 0x0d, 0x01, 0x02, 0x7f]),
            ValueError::Wire(WireError::MalformedTag { byte: 0x02, offset: 3 })
        );
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let schema = demo();
        let deep = [0x80u8, 0x0a].repeat(1_000_000);
        assert_eq!(
            decode(&schema, StructId(0), &deep).unwrap_err(),
            ValueError::Wire(WireError::LimitExceeded {
                what: "depth".into(),
                len: MAX_DEPTH + 1,
                max: MAX_DEPTH,
            })
        );

        // list elements are siblings
        let mut wide = vec![0x80, 0x0f, 0x96, 0x01];
        wide.extend_from_slice(&[0x80u8, 0x7f].repeat(150));
        wide.push(0x7f);
        let (v, n) = decode(&schema, StructId(0), &wide).unwrap();
        assert_eq!(n, wide.len());
        assert!(matches!(v.get("kids"), Some(Value::List(kids)) if kids.len() == 150));
    }

    #[test]
    fn signed_magnitudes_must_fit() {
        let schema = demo();
        let err = |data: &[u8]| decode(&schema, StructId(0), data).unwrap_err();
        assert_eq!(
            err(&[0x80, 0x03, 0x80, 0x80, 0x80, 0x80, 0x08, 0x7f]),
            ValueError::Wire(WireError::IntegerOverflow { offset: 2 })
        );
        assert_eq!(
            err(&[0x80, 0x84, 0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f]),
            ValueError::Wire(WireError::IntegerOverflow { offset: 2 })
        );
    }

    #[test]
    fn limits_apply_per_package() {
        let config = CompileConfig::default()
            .with_size_max("16")
            .unwrap()
            .with_list_max("2")
            .unwrap();
        let schema = schema_of(DEMO, config);

        let long = point().with("label", Value::Text("0123456789abcdef".into()));
        assert_eq!(
            encode(&schema, &long).unwrap_err(),
            ValueError::Wire(WireError::Overflow { size: 19, max: 16 })
        );

        let many = point().with("steps", Value::List(vec![Value::Int32(1); 3]));
        assert_eq!(
            encode(&schema, &many).unwrap_err(),
            ValueError::Wire(WireError::LimitExceeded { what: "steps".into(), len: 3, max: 2 })
        );
        assert_eq!(
            decode(&schema, StructId(0), &[0x80, 0x0c, 0x03, 1, 1, 1, 0x7f]).unwrap_err(),
            ValueError::Wire(WireError::LimitExceeded { what: "steps".into(), len: 3, max: 2 })
        );

        let mut data = vec![0x80, 0x08, 0x14];
        data.extend_from_slice(&[b'x'; 20]);
        data.push(0x7f);
        assert_eq!(
            decode(&schema, StructId(0), &data).unwrap_err(),
            ValueError::Wire(WireError::LimitExceeded { what: "text".into(), len: 20, max: 16 })
        );
    }

    #[test]
    fn shape_errors() {
        let schema = demo();
        assert_eq!(
            encode(&schema, &point().with("nope", Value::Bool(true))).unwrap_err(),
            ValueError::UnknownField { struct_: "point".into(), field: "nope".into() }
        );
        assert_eq!(
            encode(&schema, &point().with("count", Value::Text("1".into()))).unwrap_err(),
            ValueError::TypeMismatch { field: "count".into(), expected: "uint32".into() }
        );
        assert_eq!(
            encode(&schema, &point().with("kids", Value::List(vec![Value::Struct(None)]))).unwrap_err(),
            ValueError::NullElement { field: "kids".into() }
        );
    }

    #[test]
    fn symbolic_limits_cannot_be_evaluated() {
        let config = CompileConfig::default().with_size_max("MAX_SIZE").unwrap();
        let schema = schema_of(DEMO, config);
        assert_eq!(
            encode(&schema, &point()).unwrap_err(),
            ValueError::Limit { package: "demo".into(), which: "size limit" }
        );
    }
}
