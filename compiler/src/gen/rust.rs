//! Rust backend. Generated files contain items only, with every runtime
//! path spelled out from `::brine_colf`, so the files of one package can be
//! `include!`d into a single module.

use crate::{
    gen::{generated_notice, Backend, FieldView, StructView},
    ir::{Primitive, Type, TypeKind, WireRule},
    utils::{quote, to_pascal_case, to_snake_case},
};

pub struct RustBackend;

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "abstract", "as", "async", "await", "become", "box", "break", "const",
        "continue", "crate", "do", "dyn", "else", "enum", "extern", "false",
        "final", "fn", "for", "if", "impl", "in", "let", "loop", "macro",
        "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
        "return", "self", "Self", "static", "struct", "super", "trait", "true",
        "try", "type", "typeof", "unsafe", "unsized", "use", "virtual", "where",
        "while", "yield",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

pub fn type_name(name: &str) -> String {
    escape_rust_keyword(&to_pascal_case(name))
}

pub fn field_name(name: &str) -> String {
    escape_rust_keyword(&to_snake_case(name))
}

/// Module path of a package, from the crate root.
pub fn module_path(package: &str) -> String {
    package
        .split('/')
        .map(|seg| escape_rust_keyword(&to_snake_case(seg)))
        .collect::<Vec<_>>()
        .join("::")
}

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_name(&self, s: &StructView<'_>) -> String {
        format!("{}.rs", type_name(s.name))
    }

    fn primitive_type(&self, p: Primitive) -> String {
        match p {
            Primitive::Bool      => "bool",
            Primitive::Uint32    => "u32",
            Primitive::Uint64    => "u64",
            Primitive::Int32     => "i32",
            Primitive::Int64     => "i64",
            Primitive::Float32   => "f32",
            Primitive::Float64   => "f64",
            Primitive::Timestamp => "::brine_colf::Timestamp",
            Primitive::Text      => "String",
            Primitive::Binary    => "Vec<u8>",
        }
        .to_string()
    }

    fn struct_type(&self, name: &str, target: &str, from: &str) -> String {
        if target == from {
            type_name(name)
        } else {
            format!("crate::{}::{}", module_path(target), type_name(name))
        }
    }

    fn field_type(&self, elem: &str, ty: Type) -> String {
        match (ty.list, ty.kind) {
            (true, _) => format!("Vec<{}>", elem),
            (false, TypeKind::Struct(_)) => format!("Option<Box<{}>>", elem),
            (false, TypeKind::Primitive(_)) => elem.to_string(),
        }
    }

    fn render(&self, s: &StructView<'_>) -> String {
        let name = type_name(s.name);
        let mut out = Vec::new();

        for line in generated_notice(s).lines() {
            out.push(format!("// {}", line));
        }
        out.push(String::new());

        out.push("#[derive(Debug, Clone, PartialEq, Default)]".to_string());
        out.push(format!("pub struct {} {{", name));
        for f in &s.fields {
            out.push(format!("    pub {}: {},", field_name(f.name), f.native));
        }
        out.push("}".to_string());
        out.push(String::new());

        out.push(format!("impl {} {{", name));
        out.push("    /// Upper limit for serial byte sizes.".to_string());
        out.push(format!("    pub const SIZE_MAX: usize = {};", s.package.size_max));
        out.push("    /// Upper limit for the number of elements in a list.".to_string());
        out.push(format!("    pub const LIST_MAX: usize = {};", s.package.list_max));
        for f in &s.fields {
            out.push(String::new());
            out.push(accessors(f));
        }
        out.push("}".to_string());
        out.push(String::new());

        out.push(format!("impl ::brine_colf::Colfer for {} {{", name));
        out.push(format!("    const SIZE_MAX: usize = {}::SIZE_MAX;", name));
        out.push(format!("    const LIST_MAX: usize = {}::LIST_MAX;", name));
        out.push(String::new());
        out.push(
            "    fn encode(&self, bb: &mut ::brine_colf::ByteBufferMut) -> Result<(), ::brine_colf::WireError> {"
                .to_string(),
        );
        out.push("        bb.write_byte(::brine_colf::START)?;".to_string());
        for f in &s.fields {
            out.push(encode_field(f));
        }
        out.push("        bb.write_byte(::brine_colf::END)".to_string());
        out.push("    }".to_string());
        out.push(String::new());
        out.push(
            "    fn decode(bb: &mut ::brine_colf::ByteBuffer<'_>) -> Result<Self, ::brine_colf::WireError> {"
                .to_string(),
        );
        out.push("        bb.read_start()?;".to_string());
        if s.fields.is_empty() {
            out.push("        let o = Self::default();".to_string());
        } else {
            out.push("        let mut o = Self::default();".to_string());
        }
        out.push("        loop {".to_string());
        out.push("            let offset = bb.index();".to_string());
        out.push("            match bb.read_byte()? {".to_string());
        out.push("                ::brine_colf::END => {".to_string());
        out.push("                    bb.close_struct();".to_string());
        out.push("                    return Ok(o);".to_string());
        out.push("                }".to_string());
        for f in &s.fields {
            out.push(decode_arms(f));
        }
        out.push(
            "                byte => return Err(::brine_colf::WireError::MalformedTag { byte, offset }),"
                .to_string(),
        );
        out.push("            }".to_string());
        out.push("        }".to_string());
        out.push("    }".to_string());
        out.push("}".to_string());
        out.push(String::new());

        out.join("\n")
    }
}

fn accessors(f: &FieldView<'_>) -> String {
    let name = field_name(f.name);
    let setter = format!("set_{}", to_snake_case(f.name));
    let (get_type, get_body) = match (f.rule(), f.primitive()) {
        (WireRule::List, _) => (format!("&[{}]", f.elem_native), format!("&self.{}", name)),
        (WireRule::Nested, _) => (
            format!("Option<&{}>", f.elem_native),
            format!("self.{}.as_deref()", name),
        ),
        (_, Some(Primitive::Text)) => ("&str".to_string(), format!("&self.{}", name)),
        (_, Some(Primitive::Binary)) => ("&[u8]".to_string(), format!("&self.{}", name)),
        _ => (f.native.clone(), format!("self.{}", name)),
    };
    let (set_type, set_body) = match f.rule() {
        WireRule::Nested => (
            format!("Option<{}>", f.elem_native),
            format!("self.{} = value.map(Box::new);", name),
        ),
        _ => (f.native.clone(), format!("self.{} = value;", name)),
    };
    format!(
        "    pub fn {name}(&self) -> {get_type} {{\n        {get_body}\n    }}\n\n    pub fn {setter}(&mut self, value: {set_type}) {{\n        {set_body}\n    }}"
    )
}

fn encode_field(f: &FieldView<'_>) -> String {
    let v = format!("self.{}", field_name(f.name));
    let idx = f.index;
    let body = match f.rule() {
        WireRule::Presence => {
            return format!("        if {v} {{\n            bb.write_byte({idx})?;\n        }}");
        }
        WireRule::Varint32 => (format!("{v} != 0"), format!("bb.write_byte({idx})?;\n            bb.write_varint32({v})?;")),
        WireRule::Varint64 => (format!("{v} != 0"), format!("bb.write_byte({idx})?;\n            bb.write_varint64({v})?;")),
        WireRule::Signed32 => (format!("{v} != 0"), format!("bb.write_signed32({idx}, {v})?;")),
        WireRule::Signed64 => (format!("{v} != 0"), format!("bb.write_signed64({idx}, {v})?;")),
        WireRule::Fixed32 => (format!("{v} != 0.0"), format!("bb.write_byte({idx})?;\n            bb.write_float32({v})?;")),
        WireRule::Fixed64 => (format!("{v} != 0.0"), format!("bb.write_byte({idx})?;\n            bb.write_float64({v})?;")),
        WireRule::Timestamp => (format!("!{v}.is_zero()"), format!("bb.write_timestamp({idx}, &{v})?;")),
        WireRule::Text => (format!("!{v}.is_empty()"), format!("bb.write_byte({idx})?;\n            bb.write_text(&{v})?;")),
        WireRule::Binary => (format!("!{v}.is_empty()"), format!("bb.write_byte({idx})?;\n            bb.write_binary(&{v})?;")),
        WireRule::Nested => {
            return format!(
                "        if let Some(v) = &{v} {{\n            bb.write_byte({idx})?;\n            ::brine_colf::Colfer::encode(&**v, bb)?;\n        }}"
            );
        }
        WireRule::List => {
            return format!(
                "        if !{v}.is_empty() {{\n            bb.write_list_header({idx}, {v}.len(), Self::LIST_MAX, {what})?;\n            for v in &{v} {{\n                {elem}\n            }}\n        }}",
                what = quote(f.name),
                elem = encode_element(f),
            );
        }
    };
    format!("        if {} {{\n            {}\n        }}", body.0, body.1)
}

fn encode_element(f: &FieldView<'_>) -> String {
    match f.primitive() {
        Some(Primitive::Bool)      => "bb.write_bool_element(*v)?;",
        Some(Primitive::Uint32)    => "bb.write_varint32(*v)?;",
        Some(Primitive::Uint64)    => "bb.write_varint64(*v)?;",
        Some(Primitive::Int32)     => "bb.write_zigzag32(*v)?;",
        Some(Primitive::Int64)     => "bb.write_zigzag64(*v)?;",
        Some(Primitive::Float32)   => "bb.write_float32(*v)?;",
        Some(Primitive::Float64)   => "bb.write_float64(*v)?;",
        Some(Primitive::Timestamp) => "bb.write_timestamp_element(v)?;",
        Some(Primitive::Text)      => "bb.write_text(v)?;",
        Some(Primitive::Binary)    => "bb.write_binary(v)?;",
        None                       => "::brine_colf::Colfer::encode(v, bb)?;",
    }
    .to_string()
}

fn decode_element(f: &FieldView<'_>) -> String {
    match f.primitive() {
        Some(Primitive::Bool)      => "bb.read_bool_element()?".to_string(),
        Some(Primitive::Uint32)    => "bb.read_varint32()?".to_string(),
        Some(Primitive::Uint64)    => "bb.read_varint64()?".to_string(),
        Some(Primitive::Int32)     => "bb.read_zigzag32()?".to_string(),
        Some(Primitive::Int64)     => "bb.read_zigzag64()?".to_string(),
        Some(Primitive::Float32)   => "bb.read_float32()?".to_string(),
        Some(Primitive::Float64)   => "bb.read_float64()?".to_string(),
        Some(Primitive::Timestamp) => "bb.read_timestamp_element()?".to_string(),
        Some(Primitive::Text)      => "bb.read_text(Self::SIZE_MAX)?".to_string(),
        Some(Primitive::Binary)    => "bb.read_binary(Self::SIZE_MAX)?".to_string(),
        None => format!("<{} as ::brine_colf::Colfer>::decode(bb)?", f.elem_native),
    }
}

fn decode_arms(f: &FieldView<'_>) -> String {
    let o = format!("o.{}", field_name(f.name));
    let idx = f.index;
    let flagged = format!("0x{:02x}", f.flagged_tag());
    let arm = |tag: &str, expr: &str| format!("                {tag} => {o} = {expr},");
    match f.rule() {
        WireRule::Presence => arm(&idx.to_string(), "true"),
        WireRule::Varint32 => arm(&idx.to_string(), "bb.read_varint32()?"),
        WireRule::Varint64 => arm(&idx.to_string(), "bb.read_varint64()?"),
        WireRule::Signed32 => format!(
            "{}\n{}",
            arm(&idx.to_string(), "bb.read_positive32()?"),
            arm(&flagged, "bb.read_negated32()?")
        ),
        WireRule::Signed64 => format!(
            "{}\n{}",
            arm(&idx.to_string(), "bb.read_positive64()?"),
            arm(&flagged, "bb.read_negated64()?")
        ),
        WireRule::Fixed32 => arm(&idx.to_string(), "bb.read_float32()?"),
        WireRule::Fixed64 => arm(&idx.to_string(), "bb.read_float64()?"),
        WireRule::Timestamp => format!(
            "{}\n{}",
            arm(&idx.to_string(), "bb.read_timestamp(false)?"),
            arm(&flagged, "bb.read_timestamp(true)?")
        ),
        WireRule::Text => arm(&idx.to_string(), "bb.read_text(Self::SIZE_MAX)?"),
        WireRule::Binary => arm(&idx.to_string(), "bb.read_binary(Self::SIZE_MAX)?"),
        WireRule::Nested => arm(&idx.to_string(), &format!("Some(Box::new({}))", decode_element(f))),
        WireRule::List => format!(
            "                {idx} => {{\n                    let n = bb.read_length(Self::LIST_MAX, {what})?;\n                    let mut l = Vec::with_capacity(n);\n                    for _ in 0..n {{\n                        l.push({elem});\n                    }}\n                    {o} = l;\n                }}",
            what = quote(f.name),
            elem = decode_element(f),
        ),
    }
}
