//! The resolved intermediate representation.
//!
//! Structs live in one arena owned by [`Schema`] and refer to each other by
//! [`StructId`], so cyclic references need no special handling. The IR is
//! built once by the resolver and is read-only afterwards.

use std::path::PathBuf;

use serde::Serialize;

use crate::limits::LimitExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PackageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StructId(pub usize);

/// Largest number of fields per struct; indices run 0 through 126.
pub const MAX_FIELDS: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Uint32,
    Uint64,
    Int32,
    Int64,
    Float32,
    Float64,
    Timestamp,
    Text,
    Binary,
}

impl Primitive {
    pub const ALL: [Primitive; 10] = [
        Primitive::Bool,
        Primitive::Uint32,
        Primitive::Uint64,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Timestamp,
        Primitive::Text,
        Primitive::Binary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool      => "bool",
            Primitive::Uint32    => "uint32",
            Primitive::Uint64    => "uint64",
            Primitive::Int32     => "int32",
            Primitive::Int64     => "int64",
            Primitive::Float32   => "float32",
            Primitive::Float64   => "float64",
            Primitive::Timestamp => "timestamp",
            Primitive::Text      => "text",
            Primitive::Binary    => "binary",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// The field entry rule for a single (non-list) value of this type.
    pub fn rule(self) -> WireRule {
        match self {
            Primitive::Bool      => WireRule::Presence,
            Primitive::Uint32    => WireRule::Varint32,
            Primitive::Uint64    => WireRule::Varint64,
            Primitive::Int32     => WireRule::Signed32,
            Primitive::Int64     => WireRule::Signed64,
            Primitive::Float32   => WireRule::Fixed32,
            Primitive::Float64   => WireRule::Fixed64,
            Primitive::Timestamp => WireRule::Timestamp,
            Primitive::Text      => WireRule::Text,
            Primitive::Binary    => WireRule::Binary,
        }
    }
}

/// Meaning of bit 7 of a tag byte for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariantFlag {
    /// The flag is never set.
    Unused,
    /// Set when the integer is negative; the payload is its magnitude.
    Negative,
    /// Set when the timestamp has a sub-second remainder on the wire.
    Nanos,
}

/// How one field entry is laid out after its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WireRule {
    /// No payload: presence means true.
    Presence,
    Varint32,
    Varint64,
    Signed32,
    Signed64,
    Fixed32,
    Fixed64,
    Timestamp,
    Text,
    Binary,
    /// A recursive struct envelope.
    Nested,
    /// An element count followed by the elements.
    List,
}

impl WireRule {
    pub fn variant_flag(self) -> VariantFlag {
        match self {
            WireRule::Signed32 | WireRule::Signed64 => VariantFlag::Negative,
            WireRule::Timestamp => VariantFlag::Nanos,
            _ => VariantFlag::Unused,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeKind {
    Primitive(Primitive),
    Struct(StructId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Type {
    pub kind: TypeKind,
    pub list: bool,
}

impl Type {
    pub fn primitive(p: Primitive) -> Type {
        Type { kind: TypeKind::Primitive(p), list: false }
    }

    pub fn rule(&self) -> WireRule {
        match (self.list, self.kind) {
            (true, _) => WireRule::List,
            (false, TypeKind::Primitive(p)) => p.rule(),
            (false, TypeKind::Struct(_)) => WireRule::Nested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:   String,
    /// Position in the struct, which is also the tag index.
    pub index:  u8,
    pub ty:     Type,
    pub line:   usize,
    pub column: usize,
}

impl Field {
    /// The tag byte with the variant flag set.
    pub fn flagged_tag(&self) -> u8 {
        self.index | brine_colf_schema::FLAG
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struct {
    pub name:    String,
    pub package: PackageId,
    pub fields:  Vec<Field>,
    pub file:    Option<PathBuf>,
    pub line:    usize,
}

impl Struct {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    /// The effective name, with the configured prefix applied.
    pub name:     String,
    /// The name as declared in the schema files.
    pub declared: String,
    pub size_max: LimitExpr,
    pub list_max: LimitExpr,
    /// Structs in declaration order, across all contributing files.
    pub structs:  Vec<StructId>,
}

impl Package {
    /// The last path segment.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub packages: Vec<Package>,
    pub structs:  Vec<Struct>,
}

impl Schema {
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    pub fn struct_(&self, id: StructId) -> &Struct {
        &self.structs[id.0]
    }

    pub fn package_of(&self, id: StructId) -> &Package {
        self.package(self.struct_(id).package)
    }

    pub fn struct_ids(&self) -> impl Iterator<Item = StructId> {
        (0..self.structs.len()).map(StructId)
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> {
        (0..self.packages.len()).map(PackageId)
    }

    /// Finds a package by its effective or declared name.
    pub fn find_package(&self, name: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.name == name || p.declared == name)
            .map(PackageId)
    }

    /// Finds `name` in package `package`, by effective or declared name.
    pub fn find_struct(&self, package: &str, name: &str) -> Option<StructId> {
        let pkg = self.package(self.find_package(package)?);
        pkg.structs.iter().copied().find(|&id| self.struct_(id).name == name)
    }
}
