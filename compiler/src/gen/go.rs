//! Go backend. Each package gets a `Colfer.go` with the limit variables,
//! error types and the helpers the struct files call, so that struct files
//! only import `time` and referenced packages.

use std::collections::BTreeSet;

use crate::{
    gen::{generated_notice, Backend, FieldView, PackageView, StructView},
    ir::{Primitive, Type, TypeKind, WireRule},
    utils::{quote, title},
};

pub struct GoBackend;

fn base_name(package: &str) -> &str {
    package.rsplit('/').next().unwrap_or(package)
}

impl Backend for GoBackend {
    fn name(&self) -> &'static str {
        "go"
    }

    fn file_name(&self, s: &StructView<'_>) -> String {
        format!("{}.go", title(s.name))
    }

    fn primitive_type(&self, p: Primitive) -> String {
        match p {
            Primitive::Bool      => "bool",
            Primitive::Uint32    => "uint32",
            Primitive::Uint64    => "uint64",
            Primitive::Int32     => "int32",
            Primitive::Int64     => "int64",
            Primitive::Float32   => "float32",
            Primitive::Float64   => "float64",
            Primitive::Timestamp => "time.Time",
            Primitive::Text      => "string",
            Primitive::Binary    => "[]byte",
        }
        .to_string()
    }

    fn struct_type(&self, name: &str, target: &str, from: &str) -> String {
        if target == from {
            title(name)
        } else {
            format!("{}.{}", base_name(target), title(name))
        }
    }

    fn field_type(&self, elem: &str, ty: Type) -> String {
        match (ty.list, ty.kind) {
            (true, TypeKind::Struct(_)) => format!("[]*{}", elem),
            (true, TypeKind::Primitive(_)) => format!("[]{}", elem),
            (false, TypeKind::Struct(_)) => format!("*{}", elem),
            (false, TypeKind::Primitive(_)) => elem.to_string(),
        }
    }

    fn render(&self, s: &StructView<'_>) -> String {
        let name = title(s.name);
        let mut out = String::new();

        out.push_str(&format!("package {}\n\n", s.package.base_name()));
        for line in generated_notice(s).lines() {
            out.push_str(&format!("// {}\n", line));
        }

        let mut imports = BTreeSet::new();
        for f in &s.fields {
            if f.primitive() == Some(Primitive::Timestamp) {
                imports.insert("time".to_string());
            }
            match f.target_package {
                Some(pkg) if pkg != s.package.name => {
                    imports.insert(pkg.to_string());
                }
                _ => {}
            }
        }
        if !imports.is_empty() {
            out.push_str("\nimport (\n");
            for i in &imports {
                out.push_str(&format!("\t{}\n", quote(i)));
            }
            out.push_str(")\n");
        }

        out.push_str(&format!("\n// {} is a Colfer struct of package {}.\ntype {} struct {{\n", name, s.package.name, name));
        for f in &s.fields {
            out.push_str(&format!("\t{} {}\n", title(f.name), f.native));
        }
        out.push_str("}\n");

        // MarshalLen
        out.push_str(&format!(
            "\n// MarshalLen returns the Colfer serial byte size, or a ColferMax error\n// when a limit is exceeded.\nfunc (o *{}) MarshalLen() (int, error) {{\n\tl := 2\n",
            name
        ));
        for f in &s.fields {
            out.push_str(&marshal_len(f));
        }
        out.push_str("\tif l > ColferSizeMax {\n\t\treturn l, colferMaxError(\"serial size\", l, ColferSizeMax)\n\t}\n\treturn l, nil\n}\n");

        // MarshalTo
        out.push_str(&format!(
            "\n// MarshalTo encodes o as Colfer into buf and returns the number of bytes\n// written. The buffer must hold at least MarshalLen bytes.\nfunc (o *{}) MarshalTo(buf []byte) int {{\n\tbuf[0] = 0x80\n\ti := 1\n",
            name
        ));
        for f in &s.fields {
            out.push_str(&marshal_to(f));
        }
        out.push_str("\tbuf[i] = 0x7f\n\treturn i + 1\n}\n");

        // MarshalBinary
        out.push_str(&format!(
            "\n// MarshalBinary encodes o as Colfer conform encoding.BinaryMarshaler.\nfunc (o *{}) MarshalBinary() ([]byte, error) {{\n\tl, err := o.MarshalLen()\n\tif err != nil {{\n\t\treturn nil, err\n\t}}\n\tbuf := make([]byte, l)\n\to.MarshalTo(buf)\n\treturn buf, nil\n}}\n",
            name
        ));

        // Unmarshal
        out.push_str(&format!(
            "\n// Unmarshal decodes data as Colfer and returns the number of bytes read.\nfunc (o *{name}) Unmarshal(data []byte) (int, error) {{\n\treturn colferUnmarshal(data, o.unmarshal)\n}}\n\nfunc (o *{name}) unmarshal(data []byte) (int, error) {{\n\tif len(data) == 0 {{\n\t\treturn 0, colferEOF\n\t}}\n\tif data[0] != 0x80 {{\n\t\treturn 0, ColferError(0)\n\t}}\n\ti := 1\n\tfor {{\n\t\tif i >= len(data) {{\n\t\t\treturn i, colferEOF\n\t\t}}\n\t\theader := data[i]\n\t\ti++\n\t\tvar err error\n\t\tswitch header {{\n\t\tcase 0x7f:\n\t\t\treturn i, nil\n"
        ));
        for f in &s.fields {
            out.push_str(&unmarshal_cases(f));
        }
        out.push_str("\t\tdefault:\n\t\t\treturn i - 1, ColferError(i - 1)\n\t\t}\n\t\tif err != nil {\n\t\t\treturn i, err\n\t\t}\n\t}\n}\n");

        // UnmarshalBinary
        out.push_str(&format!(
            "\n// UnmarshalBinary decodes data as Colfer conform encoding.BinaryUnmarshaler.\n// Data past the struct is an error.\nfunc (o *{}) UnmarshalBinary(data []byte) error {{\n\ti, err := o.Unmarshal(data)\n\tif err != nil {{\n\t\treturn err\n\t}}\n\tif i < len(data) {{\n\t\treturn ColferTail(i)\n\t}}\n\treturn nil\n}}\n",
            name
        ));

        out
    }

    fn package_files(&self, package: &PackageView<'_>) -> Vec<(String, String)> {
        let code = COLFER_GO
            .replace("{{PACKAGE}}", package.base_name())
            .replace("{{SIZE_MAX}}", package.size_max)
            .replace("{{LIST_MAX}}", package.list_max);
        vec![("Colfer.go".to_string(), code)]
    }
}

fn marshal_len(f: &FieldView<'_>) -> String {
    let v = format!("o.{}", title(f.name));
    match f.rule() {
        WireRule::Presence => format!("\tif {v} {{\n\t\tl++\n\t}}\n"),
        WireRule::Varint32 => format!("\tif x := {v}; x != 0 {{\n\t\tl += 1 + colferVarint32Len(x)\n\t}}\n"),
        WireRule::Varint64 => format!("\tif x := {v}; x != 0 {{\n\t\tl += 1 + colferVarint64Len(x)\n\t}}\n"),
        WireRule::Signed32 => format!("\tif x := {v}; x != 0 {{\n\t\tl += 1 + colferVarint32Len(colferAbs32(x))\n\t}}\n"),
        WireRule::Signed64 => format!("\tif x := {v}; x != 0 {{\n\t\tl += 1 + colferVarint64Len(colferAbs64(x))\n\t}}\n"),
        WireRule::Fixed32 => format!("\tif {v} != 0 {{\n\t\tl += 5\n\t}}\n"),
        WireRule::Fixed64 => format!("\tif {v} != 0 {{\n\t\tl += 9\n\t}}\n"),
        WireRule::Timestamp => format!(
            "\tif s, ns := colferUnix({v}); ns != 0 {{\n\t\tl += 13\n\t}} else if s != 0 {{\n\t\tl += 9\n\t}}\n"
        ),
        WireRule::Text | WireRule::Binary => format!(
            "\tif x := len({v}); x != 0 {{\n\t\tl += 1 + colferVarint32Len(uint32(x)) + x\n\t}}\n"
        ),
        WireRule::Nested => format!(
            "\tif v := {v}; v != nil {{\n\t\tn, err := v.MarshalLen()\n\t\tif err != nil {{\n\t\t\treturn 0, err\n\t\t}}\n\t\tl += 1 + n\n\t}}\n"
        ),
        WireRule::List => {
            let elems = match f.primitive() {
                Some(Primitive::Bool) => "\t\tl += x\n".to_string(),
                Some(Primitive::Float32) => "\t\tl += x * 4\n".to_string(),
                Some(Primitive::Float64) => "\t\tl += x * 8\n".to_string(),
                Some(Primitive::Timestamp) => "\t\tl += x * 12\n".to_string(),
                Some(p) => {
                    let each = match p {
                        Primitive::Uint32 => "colferVarint32Len(v)",
                        Primitive::Uint64 => "colferVarint64Len(v)",
                        Primitive::Int32 => "colferVarint32Len(colferZigzag32(v))",
                        Primitive::Int64 => "colferVarint64Len(colferZigzag64(v))",
                        _ => "colferVarint32Len(uint32(len(v))) + len(v)",
                    };
                    format!("\t\tfor _, v := range {v} {{\n\t\t\tl += {each}\n\t\t}}\n")
                }
                None => format!(
                    "\t\tfor _, v := range {v} {{\n\t\t\tif v == nil {{\n\t\t\t\tl += 2\n\t\t\t\tcontinue\n\t\t\t}}\n\t\t\tn, err := v.MarshalLen()\n\t\t\tif err != nil {{\n\t\t\t\treturn 0, err\n\t\t\t}}\n\t\t\tl += n\n\t\t}}\n"
                ),
            };
            format!(
                "\tif x := len({v}); x != 0 {{\n\t\tif x > ColferListMax {{\n\t\t\treturn 0, colferMaxError({what}, x, ColferListMax)\n\t\t}}\n\t\tl += 1 + colferVarint32Len(uint32(x))\n{elems}\t}}\n",
                what = quote(f.name),
            )
        }
    }
}

fn marshal_to(f: &FieldView<'_>) -> String {
    let v = format!("o.{}", title(f.name));
    let idx = f.index;
    let flagged = f.flagged_tag();
    match f.rule() {
        WireRule::Presence => format!("\tif {v} {{\n\t\tbuf[i] = {idx}\n\t\ti++\n\t}}\n"),
        WireRule::Varint32 => format!("\tif x := {v}; x != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutVarint32(buf, i+1, x)\n\t}}\n"),
        WireRule::Varint64 => format!("\tif x := {v}; x != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutVarint64(buf, i+1, x)\n\t}}\n"),
        WireRule::Signed32 => format!(
            "\tif x := {v}; x != 0 {{\n\t\tif x < 0 {{\n\t\t\tbuf[i] = {flagged}\n\t\t}} else {{\n\t\t\tbuf[i] = {idx}\n\t\t}}\n\t\ti = colferPutVarint32(buf, i+1, colferAbs32(x))\n\t}}\n"
        ),
        WireRule::Signed64 => format!(
            "\tif x := {v}; x != 0 {{\n\t\tif x < 0 {{\n\t\t\tbuf[i] = {flagged}\n\t\t}} else {{\n\t\t\tbuf[i] = {idx}\n\t\t}}\n\t\ti = colferPutVarint64(buf, i+1, colferAbs64(x))\n\t}}\n"
        ),
        WireRule::Fixed32 => format!("\tif x := {v}; x != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutFloat32(buf, i+1, x)\n\t}}\n"),
        WireRule::Fixed64 => format!("\tif x := {v}; x != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutFloat64(buf, i+1, x)\n\t}}\n"),
        WireRule::Timestamp => format!(
            "\tif s, ns := colferUnix({v}); ns != 0 {{\n\t\tbuf[i] = {flagged}\n\t\ti = colferPutFixed64(buf, i+1, uint64(s))\n\t\ti = colferPutFixed32(buf, i, ns)\n\t}} else if s != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutFixed64(buf, i+1, uint64(s))\n\t}}\n"
        ),
        WireRule::Text | WireRule::Binary => format!(
            "\tif v := {v}; len(v) != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutVarint32(buf, i+1, uint32(len(v)))\n\t\ti += copy(buf[i:], v)\n\t}}\n"
        ),
        WireRule::Nested => format!(
            "\tif v := {v}; v != nil {{\n\t\tbuf[i] = {idx}\n\t\ti++\n\t\ti += v.MarshalTo(buf[i:])\n\t}}\n"
        ),
        WireRule::List => {
            let elem = match f.primitive() {
                Some(Primitive::Bool) => "\t\t\tif v {\n\t\t\t\tbuf[i] = 1\n\t\t\t} else {\n\t\t\t\tbuf[i] = 0\n\t\t\t}\n\t\t\ti++\n",
                Some(Primitive::Uint32) => "\t\t\ti = colferPutVarint32(buf, i, v)\n",
                Some(Primitive::Uint64) => "\t\t\ti = colferPutVarint64(buf, i, v)\n",
                Some(Primitive::Int32) => "\t\t\ti = colferPutVarint32(buf, i, colferZigzag32(v))\n",
                Some(Primitive::Int64) => "\t\t\ti = colferPutVarint64(buf, i, colferZigzag64(v))\n",
                Some(Primitive::Float32) => "\t\t\ti = colferPutFloat32(buf, i, v)\n",
                Some(Primitive::Float64) => "\t\t\ti = colferPutFloat64(buf, i, v)\n",
                Some(Primitive::Timestamp) => "\t\t\ts, ns := colferUnix(v)\n\t\t\ti = colferPutFixed64(buf, i, uint64(s))\n\t\t\ti = colferPutFixed32(buf, i, ns)\n",
                Some(Primitive::Text) | Some(Primitive::Binary) => "\t\t\ti = colferPutVarint32(buf, i, uint32(len(v)))\n\t\t\ti += copy(buf[i:], v)\n",
                None => "\t\t\tif v == nil {\n\t\t\t\tbuf[i], buf[i+1] = 0x80, 0x7f\n\t\t\t\ti += 2\n\t\t\t\tcontinue\n\t\t\t}\n\t\t\ti += v.MarshalTo(buf[i:])\n",
            };
            format!(
                "\tif x := len({v}); x != 0 {{\n\t\tbuf[i] = {idx}\n\t\ti = colferPutVarint32(buf, i+1, uint32(x))\n\t\tfor _, v := range {v} {{\n{elem}\t\t}}\n\t}}\n"
            )
        }
    }
}

fn unmarshal_cases(f: &FieldView<'_>) -> String {
    let v = format!("o.{}", title(f.name));
    let idx = f.index;
    let flagged = format!("{} | 0x80", idx);
    let case = |tag: &str, body: &str| format!("\t\tcase {tag}:\n{body}");
    match f.rule() {
        WireRule::Presence => case(&idx.to_string(), &format!("\t\t\t{v} = true\n")),
        WireRule::Varint32 => case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferVarint32(data, i)\n")),
        WireRule::Varint64 => case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferVarint64(data, i)\n")),
        WireRule::Signed32 => {
            case(&idx.to_string(), &format!("\t\t\tvar x uint32\n\t\t\tx, i, err = colferVarint32(data, i)\n\t\t\t{v} = int32(x)\n"))
                + &case(&flagged, &format!("\t\t\tvar x uint32\n\t\t\tx, i, err = colferVarint32(data, i)\n\t\t\t{v} = int32(^x + 1)\n"))
        }
        WireRule::Signed64 => {
            case(&idx.to_string(), &format!("\t\t\tvar x uint64\n\t\t\tx, i, err = colferVarint64(data, i)\n\t\t\t{v} = int64(x)\n"))
                + &case(&flagged, &format!("\t\t\tvar x uint64\n\t\t\tx, i, err = colferVarint64(data, i)\n\t\t\t{v} = int64(^x + 1)\n"))
        }
        WireRule::Fixed32 => case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferFloat32(data, i)\n")),
        WireRule::Fixed64 => case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferFloat64(data, i)\n")),
        WireRule::Timestamp => {
            case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferTime(data, i, false)\n"))
                + &case(&flagged, &format!("\t\t\t{v}, i, err = colferTime(data, i, true)\n"))
        }
        WireRule::Text => case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferText(data, i)\n")),
        WireRule::Binary => case(&idx.to_string(), &format!("\t\t\t{v}, i, err = colferBinary(data, i)\n")),
        WireRule::Nested => case(
            &idx.to_string(),
            &format!(
                "\t\t\tv := new({})\n\t\t\tvar n int\n\t\t\tn, err = v.Unmarshal(data[i:])\n\t\t\ti += n\n\t\t\t{v} = v\n",
                f.elem_native
            ),
        ),
        WireRule::List => {
            let elem = match f.primitive() {
                Some(p) => {
                    let read = match p {
                        Primitive::Bool => "colferBool(data, i)",
                        Primitive::Uint32 => "colferVarint32(data, i)",
                        Primitive::Uint64 => "colferVarint64(data, i)",
                        Primitive::Int32 => "colferSint32(data, i)",
                        Primitive::Int64 => "colferSint64(data, i)",
                        Primitive::Float32 => "colferFloat32(data, i)",
                        Primitive::Float64 => "colferFloat64(data, i)",
                        Primitive::Timestamp => "colferTime(data, i, true)",
                        Primitive::Text => "colferText(data, i)",
                        Primitive::Binary => "colferBinary(data, i)",
                    };
                    format!("\t\t\t\tl[j], i, err = {read}\n")
                }
                None => format!(
                    "\t\t\t\tv := new({})\n\t\t\t\tvar n int\n\t\t\t\tn, err = v.Unmarshal(data[i:])\n\t\t\t\ti += n\n\t\t\t\tl[j] = v\n",
                    f.elem_native
                ),
            };
            case(
                &idx.to_string(),
                &format!(
                    "\t\t\tvar x int\n\t\t\tx, i, err = colferLength(data, i, ColferListMax, {what})\n\t\t\tif err != nil {{\n\t\t\t\treturn i, err\n\t\t\t}}\n\t\t\tl := make({native}, x)\n\t\t\tfor j := range l {{\n{elem}\t\t\t\tif err != nil {{\n\t\t\t\t\treturn i, err\n\t\t\t\t}}\n\t\t\t}}\n\t\t\t{v} = l\n",
                    what = quote(f.name),
                    native = f.native,
                ),
            )
        }
    }
}

const COLFER_GO: &str = r#"package {{PACKAGE}}

// Code generated by colf(1); DO NOT EDIT.

import (
	"encoding/binary"
	"fmt"
	"io"
	"math"
	"time"
)

// ColferSizeMax is the upper limit for serial byte sizes.
var ColferSizeMax = {{SIZE_MAX}}

// ColferListMax is the upper limit for the number of elements in a list.
var ColferListMax = {{LIST_MAX}}

// ColferMax signals an upper limit breach.
type ColferMax string

// Error honors the error interface.
func (m ColferMax) Error() string { return string(m) }

// ColferError signals a data mismatch as a byte index.
type ColferError int

// Error honors the error interface.
func (i ColferError) Error() string {
	return fmt.Sprintf("colfer: unknown header at byte %d", i)
}

// ColferTail signals data continuation as a byte index.
type ColferTail int

// Error honors the error interface.
func (i ColferTail) Error() string {
	return fmt.Sprintf("colfer: data continuation at byte %d", i)
}

var colferEOF = io.ErrUnexpectedEOF

func colferMaxError(what string, n, max int) error {
	return ColferMax(fmt.Sprintf("colfer: %s %d exceeds %d", what, n, max))
}

func colferUnmarshal(data []byte, f func([]byte) (int, error)) (int, error) {
	view := data
	if len(view) > ColferSizeMax {
		view = view[:ColferSizeMax]
	}
	i, err := f(view)
	if err == colferEOF && len(data) > ColferSizeMax {
		return 0, colferMaxError("serial size", len(data), ColferSizeMax)
	}
	return i, err
}

func colferAbs32(x int32) uint32 {
	if x < 0 {
		return uint32(-x)
	}
	return uint32(x)
}

func colferAbs64(x int64) uint64 {
	if x < 0 {
		return uint64(-x)
	}
	return uint64(x)
}

func colferZigzag32(x int32) uint32 { return uint32(x<<1) ^ uint32(x>>31) }

func colferZigzag64(x int64) uint64 { return uint64(x<<1) ^ uint64(x>>63) }

func colferUnix(t time.Time) (int64, uint32) {
	if t.IsZero() {
		return 0, 0
	}
	return t.Unix(), uint32(t.Nanosecond())
}

func colferVarint32Len(x uint32) int {
	n := 1
	for ; x >= 0x80; n++ {
		x >>= 7
	}
	return n
}

func colferVarint64Len(x uint64) int {
	n := 1
	for ; x >= 0x80 && n < 9; n++ {
		x >>= 7
	}
	return n
}

func colferPutVarint32(buf []byte, i int, x uint32) int {
	for x >= 0x80 {
		buf[i] = byte(x | 0x80)
		x >>= 7
		i++
	}
	buf[i] = byte(x)
	return i + 1
}

// The ninth byte of a 64-bit varint holds the top eight bits.
func colferPutVarint64(buf []byte, i int, x uint64) int {
	for n := 0; x >= 0x80 && n < 8; n++ {
		buf[i] = byte(x | 0x80)
		x >>= 7
		i++
	}
	buf[i] = byte(x)
	return i + 1
}

func colferPutFixed32(buf []byte, i int, x uint32) int {
	binary.BigEndian.PutUint32(buf[i:], x)
	return i + 4
}

func colferPutFixed64(buf []byte, i int, x uint64) int {
	binary.BigEndian.PutUint64(buf[i:], x)
	return i + 8
}

func colferPutFloat32(buf []byte, i int, x float32) int {
	return colferPutFixed32(buf, i, math.Float32bits(x))
}

func colferPutFloat64(buf []byte, i int, x float64) int {
	return colferPutFixed64(buf, i, math.Float64bits(x))
}

func colferVarint32(data []byte, i int) (uint32, int, error) {
	var x uint32
	for shift := uint(0); shift != 28; shift += 7 {
		if i >= len(data) {
			return 0, i, colferEOF
		}
		b := data[i]
		i++
		x |= uint32(b&0x7f) << shift
		if b < 0x80 {
			return x, i, nil
		}
	}
	if i >= len(data) {
		return 0, i, colferEOF
	}
	return x | uint32(data[i])<<28, i + 1, nil
}

func colferVarint64(data []byte, i int) (uint64, int, error) {
	var x uint64
	for shift := uint(0); shift != 56; shift += 7 {
		if i >= len(data) {
			return 0, i, colferEOF
		}
		b := data[i]
		i++
		x |= uint64(b&0x7f) << shift
		if b < 0x80 {
			return x, i, nil
		}
	}
	if i >= len(data) {
		return 0, i, colferEOF
	}
	return x | uint64(data[i])<<56, i + 1, nil
}

func colferSint32(data []byte, i int) (int32, int, error) {
	x, i, err := colferVarint32(data, i)
	return int32(x>>1) ^ -int32(x&1), i, err
}

func colferSint64(data []byte, i int) (int64, int, error) {
	x, i, err := colferVarint64(data, i)
	return int64(x>>1) ^ -int64(x&1), i, err
}

func colferFixed32(data []byte, i int) (uint32, int, error) {
	if len(data)-i < 4 {
		return 0, len(data), colferEOF
	}
	return binary.BigEndian.Uint32(data[i:]), i + 4, nil
}

func colferFixed64(data []byte, i int) (uint64, int, error) {
	if len(data)-i < 8 {
		return 0, len(data), colferEOF
	}
	return binary.BigEndian.Uint64(data[i:]), i + 8, nil
}

func colferFloat32(data []byte, i int) (float32, int, error) {
	x, i, err := colferFixed32(data, i)
	return math.Float32frombits(x), i, err
}

func colferFloat64(data []byte, i int) (float64, int, error) {
	x, i, err := colferFixed64(data, i)
	return math.Float64frombits(x), i, err
}

func colferTime(data []byte, i int, nanos bool) (time.Time, int, error) {
	start := i
	s, i, err := colferFixed64(data, i)
	if err != nil {
		return time.Time{}, i, err
	}
	var ns uint32
	if nanos {
		ns, i, err = colferFixed32(data, i)
		if err != nil {
			return time.Time{}, i, err
		}
		if ns >= 1000000000 {
			return time.Time{}, start, ColferError(start)
		}
	}
	return time.Unix(int64(s), int64(ns)).In(time.UTC), i, nil
}

func colferBool(data []byte, i int) (bool, int, error) {
	if i >= len(data) {
		return false, i, colferEOF
	}
	switch data[i] {
	case 0:
		return false, i + 1, nil
	case 1:
		return true, i + 1, nil
	}
	return false, i, ColferError(i)
}

func colferLength(data []byte, i int, max int, what string) (int, int, error) {
	x, i, err := colferVarint32(data, i)
	if err != nil {
		return 0, i, err
	}
	if uint64(x) > uint64(max) {
		return 0, i, colferMaxError(what, int(x), max)
	}
	return int(x), i, nil
}

func colferBinary(data []byte, i int) ([]byte, int, error) {
	n, i, err := colferLength(data, i, ColferSizeMax, "binary")
	if err != nil {
		return nil, i, err
	}
	if len(data)-i < n {
		return nil, len(data), colferEOF
	}
	v := make([]byte, n)
	copy(v, data[i:])
	return v, i + n, nil
}

func colferText(data []byte, i int) (string, int, error) {
	n, i, err := colferLength(data, i, ColferSizeMax, "text")
	if err != nil {
		return "", i, err
	}
	if len(data)-i < n {
		return "", len(data), colferEOF
	}
	return string(data[i : i+n]), i + n, nil
}
"#;
