//! Code generation.
//!
//! A [`Backend`] supplies the native spelling of every schema type and the
//! templates for one target language. The core turns the IR into views with
//! those spellings filled in and writes one file per struct, plus whatever
//! per-package support files the backend asks for.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    error::CompileError,
    ir::{Primitive, Schema, StructId, Type, TypeKind, WireRule},
};

pub mod go;
pub mod java;
pub mod rust;

/// A package as a backend sees it.
#[derive(Debug, Clone)]
pub struct PackageView<'a> {
    /// Effective, slash-separated name.
    pub name:     &'a str,
    pub size_max: &'a str,
    pub list_max: &'a str,
    /// Struct names in declaration order.
    pub structs:  Vec<&'a str>,
}

impl PackageView<'_> {
    /// The last path segment.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(self.name)
    }
}

#[derive(Debug, Clone)]
pub struct StructView<'a> {
    pub name:    &'a str,
    pub package: PackageView<'a>,
    /// Schema file the struct was declared in.
    pub file:    Option<&'a Path>,
    pub fields:  Vec<FieldView<'a>>,
}

#[derive(Debug, Clone)]
pub struct FieldView<'a> {
    pub name:        &'a str,
    pub index:       u8,
    pub ty:          Type,
    /// Native spelling of the field storage.
    pub native:      String,
    /// Native spelling of one element, for lists, or of the referenced
    /// struct without any wrapper.
    pub elem_native: String,
    /// Effective package name of a referenced struct.
    pub target_package: Option<&'a str>,
}

impl FieldView<'_> {
    pub fn rule(&self) -> WireRule {
        self.ty.rule()
    }

    /// The primitive element type, `None` for struct references.
    pub fn primitive(&self) -> Option<Primitive> {
        match self.ty.kind {
            TypeKind::Primitive(p) => Some(p),
            TypeKind::Struct(_) => None,
        }
    }

    /// The tag byte with the variant flag set.
    pub fn flagged_tag(&self) -> u8 {
        self.index | brine_colf_schema::FLAG
    }
}

/// A target language: a type-mapping table plus templates. The wire rules
/// live in the IR and are the same for every implementation.
pub trait Backend: Sync {
    fn name(&self) -> &'static str;

    /// File name for the code of one struct.
    fn file_name(&self, s: &StructView<'_>) -> String;

    /// Directory of a package, relative to the base directory.
    fn package_dir(&self, package: &str) -> PathBuf {
        package.split('/').collect()
    }

    fn primitive_type(&self, p: Primitive) -> String;

    /// Spells struct `name` of package `target` as seen from code in package
    /// `from`.
    fn struct_type(&self, name: &str, target: &str, from: &str) -> String;

    /// Wraps an element spelling for the field storage of `ty`.
    fn field_type(&self, elem: &str, ty: Type) -> String;

    fn render(&self, s: &StructView<'_>) -> String;

    /// Support files written once per package, as `(file name, content)`.
    fn package_files(&self, _package: &PackageView<'_>) -> Vec<(String, String)> {
        Vec::new()
    }
}

fn package_view<'a>(schema: &'a Schema, id: StructId) -> PackageView<'a> {
    let pkg = schema.package_of(id);
    PackageView {
        name:     &pkg.name,
        size_max: pkg.size_max.as_str(),
        list_max: pkg.list_max.as_str(),
        structs:  pkg.structs.iter().map(|&s| schema.struct_(s).name.as_str()).collect(),
    }
}

/// Builds the view of one struct with the native spellings of `backend`.
pub fn struct_view<'a>(schema: &'a Schema, backend: &dyn Backend, id: StructId) -> StructView<'a> {
    let def = schema.struct_(id);
    let package = package_view(schema, id);
    let fields = def
        .fields
        .iter()
        .map(|f| {
            let (elem_native, target_package) = match f.ty.kind {
                TypeKind::Primitive(p) => (backend.primitive_type(p), None),
                TypeKind::Struct(target) => {
                    let target_package = schema.package_of(target).name.as_str();
                    let spelling =
                        backend.struct_type(&schema.struct_(target).name, target_package, package.name);
                    (spelling, Some(target_package))
                }
            };
            FieldView {
                name: &f.name,
                index: f.index,
                ty: f.ty,
                native: backend.field_type(&elem_native, f.ty),
                elem_native,
                target_package,
            }
        })
        .collect();

    StructView {
        name: &def.name,
        package,
        file: def.file.as_deref(),
        fields,
    }
}

/// The code for one struct, without touching the file system.
pub fn render_struct(schema: &Schema, backend: &dyn Backend, id: StructId) -> String {
    backend.render(&struct_view(schema, backend, id))
}

fn write(path: PathBuf, content: &str) -> Result<PathBuf, CompileError> {
    match fs::write(&path, content) {
        Ok(()) => {
            debug!(file = %path.display(), "wrote generated file");
            Ok(path)
        }
        Err(source) => Err(CompileError::GenerationIo { path, source }),
    }
}

/// Writes the code for every struct under `basedir` and returns the paths
/// written. Stops at the first I/O error.
pub fn generate(schema: &Schema, backend: &dyn Backend, basedir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut written = Vec::new();

    for pkg in &schema.packages {
        let Some(&first) = pkg.structs.first() else {
            continue;
        };
        let dir = basedir.join(backend.package_dir(&pkg.name));
        fs::create_dir_all(&dir).map_err(|source| CompileError::GenerationIo {
            path: dir.clone(),
            source,
        })?;
        for (name, content) in backend.package_files(&package_view(schema, first)) {
            written.push(write(dir.join(name), &content)?);
        }
        info!(
            package = %pkg.name,
            language = backend.name(),
            structs = pkg.structs.len(),
            "generating package"
        );
    }

    let ids: Vec<StructId> = schema.struct_ids().collect();
    let files = ids
        .par_iter()
        .map(|&id| {
            let view = struct_view(schema, backend, id);
            let path = basedir
                .join(backend.package_dir(view.package.name))
                .join(backend.file_name(&view));
            write(path, &backend.render(&view))
        })
        .collect::<Result<Vec<PathBuf>, CompileError>>()?;

    written.extend(files);
    Ok(written)
}

/// Languages the command line accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Go,
    Java,
    C,
    JavaScript,
}

impl Language {
    /// Case-insensitive, with the usual aliases.
    pub fn from_name(name: &str) -> Result<Language, CompileError> {
        match name.to_lowercase().as_str() {
            "rust" | "rs" => Ok(Language::Rust),
            "go" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "c" | "c++" | "cpp" => Ok(Language::C),
            "javascript" | "js" | "ecmascript" => Ok(Language::JavaScript),
            _ => Err(CompileError::UnsupportedLanguage(name.to_string())),
        }
    }

    pub fn backend(self) -> Result<&'static dyn Backend, CompileError> {
        match self {
            Language::Rust => Ok(&rust::RustBackend),
            Language::Go => Ok(&go::GoBackend),
            Language::Java => Ok(&java::JavaBackend),
            Language::C => Err(CompileError::NotImplemented("C")),
            Language::JavaScript => Err(CompileError::NotImplemented("ECMAScript")),
        }
    }
}

/// Header comment shared by the backends.
pub(crate) fn generated_notice(s: &StructView<'_>) -> String {
    match s.file {
        Some(file) => format!(
            "Code generated by colf(1); DO NOT EDIT.\nThe compiler used schema file {}.",
            file.display()
        ),
        None => "Code generated by colf(1); DO NOT EDIT.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CompileConfig, parser::parse_sources, resolver::resolve};

    fn schema() -> Schema {
        let files = parse_sources(&[
            ("a.colf", "package a\nstruct node { next node; kids []node; far b.leaf; }"),
            ("b.colf", "package b\nstruct leaf { at timestamp; }"),
        ])
        .unwrap();
        resolve(&files, &CompileConfig::default().with_prefix("x")).unwrap()
    }

    #[test]
    fn language_names() {
        assert_eq!(Language::from_name("RS").unwrap(), Language::Rust);
        assert_eq!(Language::from_name("Go").unwrap(), Language::Go);
        assert_eq!(Language::from_name("ecmascript").unwrap(), Language::JavaScript);
        assert_eq!(Language::from_name("c++").unwrap(), Language::C);
        assert!(matches!(
            Language::from_name("cobol"),
            Err(CompileError::UnsupportedLanguage(l)) if l == "cobol"
        ));
        assert!(matches!(Language::C.backend(), Err(CompileError::NotImplemented("C"))));
        assert_eq!(Language::Java.backend().unwrap().name(), "java");
    }

    #[test]
    fn views_carry_native_spellings() {
        let schema = schema();
        let view = struct_view(&schema, &rust::RustBackend, StructId(0));
        assert_eq!(view.package.name, "x/a");
        assert_eq!(view.package.structs, ["node"]);
        let native: Vec<&str> = view.fields.iter().map(|f| f.native.as_str()).collect();
        assert_eq!(native, ["Option<Box<Node>>", "Vec<Node>", "Option<Box<crate::x::b::Leaf>>"]);
        assert_eq!(view.fields[2].elem_native, "crate::x::b::Leaf");
        assert_eq!(view.fields[1].rule(), WireRule::List);
    }

    #[test]
    fn generate_writes_package_directories() {
        let schema = schema();
        let dir = tempfile::tempdir().unwrap();
        let mut written = generate(&schema, &go::GoBackend, dir.path()).unwrap();
        written.sort();
        let expect: Vec<PathBuf> = ["x/a/Colfer.go", "x/a/Node.go", "x/b/Colfer.go", "x/b/Leaf.go"]
            .iter()
            .map(|p| dir.path().join(p))
            .collect();
        assert_eq!(written, expect);
        for p in &written {
            assert!(p.is_file());
        }

        // directories exist already
        assert_eq!(generate(&schema, &go::GoBackend, dir.path()).unwrap().len(), 4);
    }

    #[test]
    fn generate_reports_io_failure() {
        let schema = schema();
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("x");
        fs::write(&blocker, "not a directory").unwrap();
        match generate(&schema, &java::JavaBackend, dir.path()) {
            Err(CompileError::GenerationIo { path, .. }) => assert_eq!(path, blocker.join("a")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
