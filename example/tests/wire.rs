#![cfg(test)]

use std::path::PathBuf;

use brine_colf::{Colfer, Timestamp, WireError, MAX_DEPTH};
use brine_colf_compiler::{
    compile_files,
    value::{self, StructValue, Value},
    CompileConfig, Schema,
};
use example_app::{
    demo::{ext::Mark, Shape},
    tight::Frame,
};

fn full_shape() -> Shape {
    Shape {
        flag: true,
        count: 300,
        big: u64::MAX,
        delta: -5,
        offset: i64::MIN,
        ratio: 0.5,
        weight: -2.25,
        at: Timestamp::new(1_500_000_000, 42).unwrap(),
        label: "hello".to_string(),
        blob: vec![0, 1, 2],
        next: Some(Box::new(Shape { label: "inner".to_string(), ..Default::default() })),
        tags: vec!["a".to_string(), String::new()],
        steps: vec![-1, 1, i32::MAX],
        checks: vec![true, false],
        stamps: vec![Timestamp::from_seconds(-1), Timestamp::new(7, 8).unwrap()],
        kids: vec![Shape::default(), Shape { count: 1, ..Default::default() }],
        marks: vec![Mark { id: 9, note: "nine".to_string() }],
    }
}

#[test]
fn zero_value() {
    assert_eq!(Shape::default().marshal(), Ok(vec![0x80, 0x7f]));
    assert_eq!(Shape::unmarshal(&[0x80, 0x7f]), Ok((Shape::default(), 2)));
}

#[test]
fn round_trip() {
    let shape = full_shape();
    let data = shape.marshal().unwrap();
    assert_eq!(Shape::unmarshal(&data), Ok((shape, data.len())));
}

#[test]
fn consumed_length_ignores_trailing_data() {
    let shape = Shape { count: 1, ..Default::default() };
    let mut data = shape.marshal().unwrap();
    let n = data.len();
    data.extend_from_slice(&[0xaa, 0xbb]);
    assert_eq!(Shape::unmarshal(&data), Ok((shape, n)));
}

#[test]
fn primitive_entries() {
    let shape = Shape {
        flag: true,
        count: 300,
        delta: -5,
        label: "hi".to_string(),
        ..Default::default()
    };
    assert_eq!(
        shape.marshal().unwrap(),
        [0x80, 0x00, 0x01, 0xac, 0x02, 0x83, 0x05, 0x08, 0x02, b'h', b'i', 0x7f]
    );
}

#[test]
fn varint_boundaries() {
    let cases = [
        (0u32, 2usize),
        (127, 4),
        (128, 5),
        ((1 << 28) - 1, 7),
        (1 << 28, 8),
        (u32::MAX, 8),
    ];
    for (count, size) in cases {
        let shape = Shape { count, ..Default::default() };
        let data = shape.marshal().unwrap();
        assert_eq!(data.len(), size, "count {}", count);
        assert_eq!(Shape::unmarshal(&data).unwrap().0.count, count);
    }
}

#[test]
fn negative_integers_carry_the_magnitude() {
    let shape = Shape { offset: i64::MIN, ..Default::default() };
    let data = shape.marshal().unwrap();
    let mut want = vec![0x80, 0x84];
    want.extend_from_slice(&[0x80; 9]);
    want.push(0x7f);
    assert_eq!(data, want);
    assert_eq!(Shape::unmarshal(&data).unwrap().0.offset, i64::MIN);

    let shape = Shape { delta: i32::MIN, ..Default::default() };
    let data = shape.marshal().unwrap();
    assert_eq!(data, [0x80, 0x83, 0x80, 0x80, 0x80, 0x80, 0x08, 0x7f]);
    assert_eq!(Shape::unmarshal(&data).unwrap().0.delta, i32::MIN);
}

#[test]
fn timestamps() {
    let shape = Shape { at: Timestamp::from_seconds(1), ..Default::default() };
    assert_eq!(shape.marshal().unwrap(), [0x80, 0x07, 0, 0, 0, 0, 0, 0, 0, 1, 0x7f]);

    let shape = Shape { at: Timestamp::new(-1, 1).unwrap(), ..Default::default() };
    let data = shape.marshal().unwrap();
    assert_eq!(
        data,
        [0x80, 0x87, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 1, 0x7f]
    );
    assert_eq!(Shape::unmarshal(&data).unwrap().0, shape);
}

#[test]
fn list_elements() {
    let shape = Shape {
        steps: vec![-1, 1],
        checks: vec![true, false],
        ..Default::default()
    };
    assert_eq!(
        shape.marshal().unwrap(),
        [0x80, 0x0c, 0x02, 0x01, 0x02, 0x0d, 0x02, 0x01, 0x00, 0x7f]
    );

    let shape = Shape { stamps: vec![Timestamp::default()], ..Default::default() };
    assert_eq!(
        shape.marshal().unwrap(),
        [0x80, 0x0e, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x7f]
    );
}

#[test]
fn size_limit() {
    let frame = Frame { name: "x".repeat(70), ..Default::default() };
    assert_eq!(frame.marshal(), Err(WireError::Overflow { size: 73, max: 64 }));

    // the same content fits the default limit
    let shape = Shape { label: "x".repeat(70), ..Default::default() };
    assert_eq!(shape.marshal().map(|d| d.len()), Ok(74));

    let mut data = vec![0x80, 0x00, 70];
    data.extend_from_slice(&[b'x'; 70]);
    data.push(0x7f);
    assert_eq!(
        Frame::unmarshal(&data),
        Err(WireError::LimitExceeded { what: "text".to_string(), len: 70, max: 64 })
    );

    // every length is in range, but the whole does not fit
    let mut data = vec![0x80, 0x00, 59];
    data.extend_from_slice(&[b'x'; 59]);
    data.extend_from_slice(&[0x01, 3, 1, 2, 3, 0x7f]);
    assert_eq!(data.len(), 68);
    assert_eq!(
        Frame::unmarshal(&data),
        Err(WireError::LimitExceeded { what: "serial".to_string(), len: 68, max: 64 })
    );
}

#[test]
fn list_limit() {
    let frame = Frame { ids: vec![1, 2, 3, 4, 5], ..Default::default() };
    assert_eq!(
        frame.marshal(),
        Err(WireError::LimitExceeded { what: "ids".to_string(), len: 5, max: 4 })
    );

    let frame = Frame { ids: vec![1, 2, 3, 4], ..Default::default() };
    let data = frame.marshal().unwrap();
    assert_eq!(Frame::unmarshal(&data), Ok((frame, data.len())));

    assert_eq!(
        Frame::unmarshal(&[0x80, 0x02, 0x05, 1, 2, 3, 4, 5, 0x7f]),
        Err(WireError::LimitExceeded { what: "ids".to_string(), len: 5, max: 4 })
    );
}

#[test]
fn malformed_input() {
    assert_eq!(Shape::unmarshal(&[]), Err(WireError::Truncated));
    assert_eq!(Shape::unmarshal(&[0x80, 0x01, 0x05]), Err(WireError::Truncated));
    assert_eq!(
        Shape::unmarshal(&[0x7f]),
        Err(WireError::MalformedTag { byte: 0x7f, offset: 0 })
    );
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x7e, 0x7f]),
        Err(WireError::MalformedTag { byte: 0x7e, offset: 1 })
    );
    // uint32 has no variant
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x81, 0x01, 0x7f]),
        Err(WireError::MalformedTag { byte: 0x81, offset: 1 })
    );
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x0d, 0x01, 0x02, 0x7f]),
        Err(WireError::MalformedTag { byte: 0x02, offset: 3 })
    );
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x08, 0x01, 0xff, 0x7f]),
        Err(WireError::InvalidUtf8 { offset: 3 })
    );
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x87, 0, 0, 0, 0, 0, 0, 0, 0, 0x3b, 0x9a, 0xca, 0x00, 0x7f]),
        Err(WireError::InvalidTimestamp { offset: 2 })
    );
}

#[test]
fn nesting_depth_is_bounded() {
    let deep = [0x80u8, 0x0a].repeat(1_000_000);
    assert_eq!(
        Shape::unmarshal(&deep),
        Err(WireError::LimitExceeded { what: "depth".to_string(), len: MAX_DEPTH + 1, max: MAX_DEPTH })
    );

    let mut shape = Shape::default();
    for _ in 1..MAX_DEPTH {
        shape = Shape { next: Some(Box::new(shape)), ..Default::default() };
    }
    let data = shape.marshal().unwrap();
    assert_eq!(Shape::unmarshal(&data), Ok((shape, data.len())));

    let wide = Shape { kids: vec![Shape::default(); 2 * MAX_DEPTH], ..Default::default() };
    let data = wide.marshal().unwrap();
    assert_eq!(Shape::unmarshal(&data), Ok((wide, data.len())));
}

#[test]
fn signed_magnitude_out_of_range() {
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x03, 0x80, 0x80, 0x80, 0x80, 0x08, 0x7f]),
        Err(WireError::IntegerOverflow { offset: 2 })
    );
    assert_eq!(
        Shape::unmarshal(&[0x80, 0x83, 0x81, 0x80, 0x80, 0x80, 0x08, 0x7f]),
        Err(WireError::IntegerOverflow { offset: 2 })
    );
    let mut data = vec![0x80, 0x04];
    data.extend_from_slice(&[0x80; 9]);
    data.push(0x7f);
    assert_eq!(Shape::unmarshal(&data), Err(WireError::IntegerOverflow { offset: 2 }));
}

#[test]
fn fields_in_any_order() {
    let data = [0x80, 0x08, 0x01, b'z', 0x00, 0x01, 0x05, 0x7f];
    let (shape, _) = Shape::unmarshal(&data).unwrap();
    assert!(shape.flag);
    assert_eq!(shape.label(), "z");
    assert_eq!(shape.count, 5);
}

fn demo_schema() -> Schema {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schema");
    compile_files(&[dir.join("demo.colf"), dir.join("ext.colf")], &CompileConfig::default()).unwrap()
}

fn shape_value(schema: &Schema) -> StructValue {
    let shape = schema.find_struct("demo", "shape").unwrap();
    let mark = schema.find_struct("demo/ext", "mark").unwrap();
    StructValue::new(shape)
        .with("flag", Value::Bool(true))
        .with("count", Value::Uint32(300))
        .with("big", Value::Uint64(u64::MAX))
        .with("delta", Value::Int32(-5))
        .with("offset", Value::Int64(i64::MIN))
        .with("ratio", Value::Float32(0.5))
        .with("weight", Value::Float64(-2.25))
        .with("at", Value::Timestamp(Timestamp::new(1_500_000_000, 42).unwrap()))
        .with("label", Value::Text("hello".to_string()))
        .with("blob", Value::Binary(vec![0, 1, 2]))
        .with(
            "next",
            Value::struct_(StructValue::new(shape).with("label", Value::Text("inner".to_string()))),
        )
        .with("tags", Value::List(vec![Value::Text("a".to_string()), Value::Text(String::new())]))
        .with("steps", Value::List(vec![Value::Int32(-1), Value::Int32(1), Value::Int32(i32::MAX)]))
        .with("checks", Value::List(vec![Value::Bool(true), Value::Bool(false)]))
        .with(
            "stamps",
            Value::List(vec![
                Value::Timestamp(Timestamp::from_seconds(-1)),
                Value::Timestamp(Timestamp::new(7, 8).unwrap()),
            ]),
        )
        .with(
            "kids",
            Value::List(vec![
                Value::struct_(StructValue::new(shape)),
                Value::struct_(StructValue::new(shape).with("count", Value::Uint32(1))),
            ]),
        )
        .with(
            "marks",
            Value::List(vec![Value::struct_(
                StructValue::new(mark)
                    .with("id", Value::Uint64(9))
                    .with("note", Value::Text("nine".to_string())),
            )]),
        )
}

#[test]
fn generated_code_matches_the_reference_codec() {
    let schema = demo_schema();
    let value = shape_value(&schema);

    let want = value::encode(&schema, &value).unwrap();
    let got = full_shape().marshal().unwrap();
    assert_eq!(got, want);

    let (decoded, n) = value::decode(&schema, value.type_id, &got).unwrap();
    assert_eq!(n, got.len());
    assert_eq!(decoded, value.normalized());
}
