//! Java backend: one bean class per struct, each with private copies of the
//! varint helpers so that classes of different packages stay independent.

use crate::{
    gen::{generated_notice, Backend, FieldView, StructView},
    ir::{Primitive, Type, TypeKind, WireRule},
    utils::{quote, title},
};

pub struct JavaBackend;

fn escape_java_keyword(s: &str) -> String {
    let keywords = [
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char",
        "class", "const", "continue", "default", "do", "double", "else", "enum",
        "extends", "false", "final", "finally", "float", "for", "goto", "if",
        "implements", "import", "instanceof", "int", "interface", "long", "native",
        "new", "null", "package", "private", "protected", "public", "return",
        "short", "static", "strictfp", "super", "switch", "synchronized", "this",
        "throw", "throws", "transient", "true", "try", "void", "volatile", "while",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

pub fn package_name(package: &str) -> String {
    package.replace('/', ".")
}

fn field_name(f: &FieldView<'_>) -> String {
    escape_java_keyword(f.name)
}

/// `new T[n]`, with the dimension in the right place for array elements.
fn new_array(elem: &str, n: &str) -> String {
    match elem.strip_suffix("[]") {
        Some(base) => format!("new {}[{}][]", base, n),
        None => format!("new {}[{}]", elem, n),
    }
}

impl Backend for JavaBackend {
    fn name(&self) -> &'static str {
        "java"
    }

    fn file_name(&self, s: &StructView<'_>) -> String {
        format!("{}.java", title(s.name))
    }

    fn primitive_type(&self, p: Primitive) -> String {
        match p {
            Primitive::Bool      => "boolean",
            Primitive::Uint32    => "int",
            Primitive::Uint64    => "long",
            Primitive::Int32     => "int",
            Primitive::Int64     => "long",
            Primitive::Float32   => "float",
            Primitive::Float64   => "double",
            Primitive::Timestamp => "java.time.Instant",
            Primitive::Text      => "String",
            Primitive::Binary    => "byte[]",
        }
        .to_string()
    }

    fn struct_type(&self, name: &str, target: &str, from: &str) -> String {
        if target == from {
            title(name)
        } else {
            format!("{}.{}", package_name(target), title(name))
        }
    }

    fn field_type(&self, elem: &str, ty: Type) -> String {
        if ty.list {
            format!("{}[]", elem)
        } else {
            elem.to_string()
        }
    }

    fn render(&self, s: &StructView<'_>) -> String {
        let name = title(s.name);
        let mut out = String::new();

        out.push_str(&format!("package {};\n\n", package_name(s.package.name)));
        for line in generated_notice(s).lines() {
            out.push_str(&format!("// {}\n", line));
        }
        out.push_str(&format!(
            "\n\n/**\n * Data bean with built-in serialization support.\n */\npublic class {} implements java.io.Serializable {{\n\n",
            name
        ));
        out.push_str(&format!(
            "\t/** The upper limit for serial byte sizes. */\n\tpublic static int colferSizeMax = {};\n\n\t/** The upper limit for the number of elements in a list. */\n\tpublic static int colferListMax = {};\n\n",
            s.package.size_max, s.package.list_max
        ));
        out.push_str("\tprivate static final java.nio.charset.Charset utf8 = java.nio.charset.StandardCharsets.UTF_8;\n\n");
        for f in &s.fields {
            out.push_str(&format!("\tpublic {} {};\n", f.native, field_name(f)));
        }
        out.push('\n');

        out.push_str(
            "\n\t/**\n\t * Writes in Colfer format.\n\t * @param buf the data destination.\n\t * @throws java.nio.BufferOverflowException when {@code buf} is too small.\n\t * @throws IllegalStateException when a size or list limit is exceeded.\n\t */\n\tpublic final void marshal(java.nio.ByteBuffer buf) {\n\t\tint start = buf.position();\n\t\tbuf.order(java.nio.ByteOrder.BIG_ENDIAN);\n\t\tbuf.put((byte) 0x80);\n",
        );
        for f in &s.fields {
            out.push_str(&marshal_field(f));
        }
        out.push_str(
            "\n\t\tbuf.put((byte) 0x7f);\n\t\tif (buf.position() - start > colferSizeMax)\n\t\t\tthrow new IllegalStateException(String.format(\"colfer: serial size %d exceeds %d bytes\", buf.position() - start, colferSizeMax));\n\t}\n",
        );

        out.push_str(
            "\n\t/**\n\t * Reads in Colfer format.\n\t * @param buf the data source.\n\t * @throws java.nio.BufferUnderflowException when {@code buf} is incomplete.\n\t * @throws java.util.InputMismatchException on malformed data.\n\t * @throws SecurityException when a size or list limit is exceeded.\n\t */\n\tpublic final void unmarshal(java.nio.ByteBuffer buf) {\n\t\tbuf.order(java.nio.ByteOrder.BIG_ENDIAN);\n\t\tint start = buf.position();\n\t\tint limit = buf.limit();\n\t\tboolean capped = limit - start > colferSizeMax;\n\t\tif (capped) buf.limit(start + colferSizeMax);\n\t\ttry {\n\t\t\tread(buf);\n\t\t} catch (java.nio.BufferUnderflowException e) {\n\t\t\tif (capped)\n\t\t\t\tthrow new SecurityException(String.format(\"colfer: serial size exceeds %d bytes\", colferSizeMax));\n\t\t\tthrow e;\n\t\t} finally {\n\t\t\tbuf.limit(limit);\n\t\t}\n\t}\n",
        );
        out.push_str(
            "\n\tprivate void read(java.nio.ByteBuffer buf) {\n\t\tif (buf.get() != (byte) 0x80)\n\t\t\tthrow new java.util.InputMismatchException(String.format(\"colfer: unknown header at byte %d\", buf.position() - 1));\n\n\t\twhile (true) {\n\t\t\tbyte header = buf.get();\n\t\t\tswitch (header) {\n\t\t\tcase (byte) 0x7f:\n\t\t\t\treturn;\n",
        );
        for f in &s.fields {
            out.push_str(&unmarshal_cases(f));
        }
        out.push_str(
            "\t\t\tdefault:\n\t\t\t\tthrow new java.util.InputMismatchException(String.format(\"colfer: unknown header at byte %d\", buf.position() - 1));\n\t\t\t}\n\t\t}\n\t}\n\n",
        );

        for f in &s.fields {
            let field = field_name(f);
            let accessor = title(&field);
            out.push_str(&format!(
                "\tpublic {native} get{accessor}() {{\n\t\treturn this.{field};\n\t}}\n\n\tpublic void set{accessor}({native} value) {{\n\t\tthis.{field} = value;\n\t}}\n\n",
                native = f.native,
            ));
        }

        out.push_str(JAVA_HELPERS);
        out.push_str("}\n");
        out
    }
}

fn marshal_field(f: &FieldView<'_>) -> String {
    let v = format!("this.{}", field_name(f));
    let idx = f.index;
    let flagged = format!("0x{:02x}", f.flagged_tag());
    match f.rule() {
        WireRule::Presence => format!("\n\t\tif ({v}) {{\n\t\t\tbuf.put((byte) {idx});\n\t\t}}\n"),
        WireRule::Varint32 | WireRule::Varint64 => {
            format!("\n\t\tif ({v} != 0) {{\n\t\t\tbuf.put((byte) {idx});\n\t\t\tputVarint(buf, {v});\n\t\t}}\n")
        }
        WireRule::Signed32 | WireRule::Signed64 => {
            let ty = if f.rule() == WireRule::Signed32 { "int" } else { "long" };
            format!(
                "\n\t\tif ({v} != 0) {{\n\t\t\t{ty} x = {v};\n\t\t\tif (x < 0) {{\n\t\t\t\tx = -x;\n\t\t\t\tbuf.put((byte) {flagged});\n\t\t\t}} else\n\t\t\t\tbuf.put((byte) {idx});\n\t\t\tputVarint(buf, x);\n\t\t}}\n"
            )
        }
        WireRule::Fixed32 => format!("\n\t\tif ({v} != 0.0f) {{\n\t\t\tbuf.put((byte) {idx});\n\t\t\tbuf.putFloat({v});\n\t\t}}\n"),
        WireRule::Fixed64 => format!("\n\t\tif ({v} != 0.0) {{\n\t\t\tbuf.put((byte) {idx});\n\t\t\tbuf.putDouble({v});\n\t\t}}\n"),
        WireRule::Timestamp => format!(
            "\n\t\tif ({v} != null) {{\n\t\t\tlong s = {v}.getEpochSecond();\n\t\t\tint ns = {v}.getNano();\n\t\t\tif (ns == 0) {{\n\t\t\t\tif (s != 0) {{\n\t\t\t\t\tbuf.put((byte) {idx});\n\t\t\t\t\tbuf.putLong(s);\n\t\t\t\t}}\n\t\t\t}} else {{\n\t\t\t\tbuf.put((byte) {flagged});\n\t\t\t\tbuf.putLong(s);\n\t\t\t\tbuf.putInt(ns);\n\t\t\t}}\n\t\t}}\n"
        ),
        WireRule::Text => format!(
            "\n\t\tif ({v} != null && !{v}.isEmpty()) {{\n\t\t\tjava.nio.ByteBuffer bytes = utf8.encode({v});\n\t\t\tbuf.put((byte) {idx});\n\t\t\tputVarint(buf, bytes.limit());\n\t\t\tbuf.put(bytes);\n\t\t}}\n"
        ),
        WireRule::Binary => format!(
            "\n\t\tif ({v} != null && {v}.length != 0) {{\n\t\t\tbuf.put((byte) {idx});\n\t\t\tputVarint(buf, {v}.length);\n\t\t\tbuf.put({v});\n\t\t}}\n"
        ),
        WireRule::Nested => format!("\n\t\tif ({v} != null) {{\n\t\t\tbuf.put((byte) {idx});\n\t\t\t{v}.marshal(buf);\n\t\t}}\n"),
        WireRule::List => {
            let elem = match f.primitive() {
                Some(Primitive::Bool) => "\t\t\t\tbuf.put((byte) (v ? 1 : 0));\n",
                Some(Primitive::Uint32) | Some(Primitive::Uint64) => "\t\t\t\tputVarint(buf, v);\n",
                Some(Primitive::Int32) => "\t\t\t\tputVarint(buf, (v << 1) ^ (v >> 31));\n",
                Some(Primitive::Int64) => "\t\t\t\tputVarint(buf, (v << 1) ^ (v >> 63));\n",
                Some(Primitive::Float32) => "\t\t\t\tbuf.putFloat(v);\n",
                Some(Primitive::Float64) => "\t\t\t\tbuf.putDouble(v);\n",
                Some(Primitive::Timestamp) => "\t\t\t\tif (v == null) {\n\t\t\t\t\tbuf.putLong(0);\n\t\t\t\t\tbuf.putInt(0);\n\t\t\t\t} else {\n\t\t\t\t\tbuf.putLong(v.getEpochSecond());\n\t\t\t\t\tbuf.putInt(v.getNano());\n\t\t\t\t}\n",
                Some(Primitive::Text) => "\t\t\t\tjava.nio.ByteBuffer bytes = utf8.encode(v == null ? \"\" : v);\n\t\t\t\tputVarint(buf, bytes.limit());\n\t\t\t\tbuf.put(bytes);\n",
                Some(Primitive::Binary) => "\t\t\t\tif (v == null) {\n\t\t\t\t\tbuf.put((byte) 0);\n\t\t\t\t} else {\n\t\t\t\t\tputVarint(buf, v.length);\n\t\t\t\t\tbuf.put(v);\n\t\t\t\t}\n",
                None => "\t\t\t\tif (v == null) {\n\t\t\t\t\tbuf.put((byte) 0x80);\n\t\t\t\t\tbuf.put((byte) 0x7f);\n\t\t\t\t} else\n\t\t\t\t\tv.marshal(buf);\n",
            };
            format!(
                "\n\t\tif ({v} != null && {v}.length != 0) {{\n\t\t\tif ({v}.length > colferListMax)\n\t\t\t\tthrow new IllegalStateException(String.format(\"colfer: field {what} length %d exceeds %d elements\", {v}.length, colferListMax));\n\t\t\tbuf.put((byte) {idx});\n\t\t\tputVarint(buf, {v}.length);\n\t\t\tfor ({elem_ty} v : {v}) {{\n{elem}\t\t\t}}\n\t\t}}\n",
                what = f.name,
                elem_ty = f.elem_native,
            )
        }
    }
}

fn unmarshal_cases(f: &FieldView<'_>) -> String {
    let v = format!("this.{}", field_name(f));
    let idx = f.index;
    let flagged = format!("0x{:02x}", f.flagged_tag());
    let case = |tag: &str, stmt: &str| format!("\t\t\tcase (byte) {tag}:\n\t\t\t\t{stmt}\n\t\t\t\tbreak;\n");
    let plain = idx.to_string();
    match f.rule() {
        WireRule::Presence => case(&plain, &format!("{v} = true;")),
        WireRule::Varint32 => case(&plain, &format!("{v} = getVarint32(buf);")),
        WireRule::Varint64 => case(&plain, &format!("{v} = getVarint64(buf);")),
        WireRule::Signed32 => {
            case(&plain, &format!("{v} = getVarint32(buf);")) + &case(&flagged, &format!("{v} = (~getVarint32(buf)) + 1;"))
        }
        WireRule::Signed64 => {
            case(&plain, &format!("{v} = getVarint64(buf);")) + &case(&flagged, &format!("{v} = (~getVarint64(buf)) + 1;"))
        }
        WireRule::Fixed32 => case(&plain, &format!("{v} = buf.getFloat();")),
        WireRule::Fixed64 => case(&plain, &format!("{v} = buf.getDouble();")),
        WireRule::Timestamp => {
            case(&plain, &format!("{v} = getInstant(buf, false);")) + &case(&flagged, &format!("{v} = getInstant(buf, true);"))
        }
        WireRule::Text => case(&plain, &format!("{v} = getText(buf);")),
        WireRule::Binary => case(&plain, &format!("{v} = getBinary(buf);")),
        WireRule::Nested => case(
            &plain,
            &format!("{v} = new {ty}();\n\t\t\t\t{v}.unmarshal(buf);", ty = f.elem_native),
        ),
        WireRule::List => {
            let elem = match f.primitive() {
                Some(p) => {
                    let read = match p {
                        Primitive::Bool => "getBool(buf)",
                        Primitive::Uint32 => "getVarint32(buf)",
                        Primitive::Uint64 => "getVarint64(buf)",
                        Primitive::Int32 => "getZigzag32(buf)",
                        Primitive::Int64 => "getZigzag64(buf)",
                        Primitive::Float32 => "buf.getFloat()",
                        Primitive::Float64 => "buf.getDouble()",
                        Primitive::Timestamp => "getInstant(buf, true)",
                        Primitive::Text => "getText(buf)",
                        Primitive::Binary => "getBinary(buf)",
                    };
                    format!("\t\t\t\t\ta[i] = {read};\n")
                }
                None => format!(
                    "\t\t\t\t\t{ty} v = new {ty}();\n\t\t\t\t\tv.unmarshal(buf);\n\t\t\t\t\ta[i] = v;\n",
                    ty = f.elem_native
                ),
            };
            format!(
                "\t\t\tcase (byte) {idx}: {{\n\t\t\t\tint n = getLength(buf, colferListMax, {what});\n\t\t\t\t{native} a = {alloc};\n\t\t\t\tfor (int i = 0; i < n; i++) {{\n{elem}\t\t\t\t}}\n\t\t\t\t{v} = a;\n\t\t\t\tbreak;\n\t\t\t}}\n",
                what = quote(f.name),
                native = f.native,
                alloc = new_array(&f.elem_native, "n"),
            )
        }
    }
}

const JAVA_HELPERS: &str = "\t/**
\t * Serializes an integer.
\t * @param buf the data destination.
\t * @param x the value.
\t */
\tprivate static void putVarint(java.nio.ByteBuffer buf, int x) {
\t\twhile ((x & 0xffffff80) != 0) {
\t\t\tbuf.put((byte) (x | 0x80));
\t\t\tx >>>= 7;
\t\t}
\t\tbuf.put((byte) x);
\t}

\t/**
\t * Serializes an integer. The ninth byte holds the top eight bits.
\t * @param buf the data destination.
\t * @param x the value.
\t */
\tprivate static void putVarint(java.nio.ByteBuffer buf, long x) {
\t\tfor (int i = 0; i < 8 && (x & 0xffffffffffffff80L) != 0; i++) {
\t\t\tbuf.put((byte) (x | 0x80));
\t\t\tx >>>= 7;
\t\t}
\t\tbuf.put((byte) x);
\t}

\tprivate static int getVarint32(java.nio.ByteBuffer buf) {
\t\tint x = 0;
\t\tfor (int shift = 0; shift != 28; shift += 7) {
\t\t\tint b = buf.get() & 0xff;
\t\t\tx |= (b & 0x7f) << shift;
\t\t\tif (b < 0x80) return x;
\t\t}
\t\tlong b = buf.get() & 0xffL;
\t\tx |= b << 28;
\t\treturn x;
\t}

\tprivate static long getVarint64(java.nio.ByteBuffer buf) {
\t\tlong x = 0;
\t\tfor (int shift = 0; shift != 56; shift += 7) {
\t\t\tlong b = buf.get() & 0xffL;
\t\t\tx |= (b & 0x7f) << shift;
\t\t\tif (b < 0x80) return x;
\t\t}
\t\treturn x | (buf.get() & 0xffL) << 56;
\t}

\tprivate static int getZigzag32(java.nio.ByteBuffer buf) {
\t\tint x = getVarint32(buf);
\t\treturn (x >>> 1) ^ -(x & 1);
\t}

\tprivate static long getZigzag64(java.nio.ByteBuffer buf) {
\t\tlong x = getVarint64(buf);
\t\treturn (x >>> 1) ^ -(x & 1);
\t}

\tprivate static int getLength(java.nio.ByteBuffer buf, int max, String what) {
\t\tint n = getVarint32(buf);
\t\tif (n < 0 || n > max)
\t\t\tthrow new SecurityException(String.format(\"colfer: %s length %d exceeds %d\", what, n & 0xffffffffL, max));
\t\treturn n;
\t}

\tprivate static boolean getBool(java.nio.ByteBuffer buf) {
\t\tbyte b = buf.get();
\t\tif (b == 0) return false;
\t\tif (b == 1) return true;
\t\tthrow new java.util.InputMismatchException(String.format(\"colfer: malformed boolean at byte %d\", buf.position() - 1));
\t}

\tprivate static java.time.Instant getInstant(java.nio.ByteBuffer buf, boolean nanos) {
\t\tint start = buf.position();
\t\tlong s = buf.getLong();
\t\tint ns = nanos ? buf.getInt() : 0;
\t\tif (ns < 0 || ns > 999999999)
\t\t\tthrow new java.util.InputMismatchException(String.format(\"colfer: malformed timestamp at byte %d\", start));
\t\treturn java.time.Instant.ofEpochSecond(s, ns);
\t}

\tprivate static String getText(java.nio.ByteBuffer buf) {
\t\treturn new String(getBinary(buf, \"text\"), utf8);
\t}

\tprivate static byte[] getBinary(java.nio.ByteBuffer buf) {
\t\treturn getBinary(buf, \"binary\");
\t}

\tprivate static byte[] getBinary(java.nio.ByteBuffer buf, String what) {
\t\tbyte[] b = new byte[getLength(buf, colferSizeMax, what)];
\t\tbuf.get(b);
\t\treturn b;
\t}

";
