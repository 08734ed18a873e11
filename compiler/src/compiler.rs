use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    config::CompileConfig,
    error::CompileError,
    gen::{generate, Backend, Language},
    ir::Schema,
    parser::{parse_files, parse_sources},
    resolver::resolve,
};

fn require_structs(schema: Schema) -> Result<Schema, CompileError> {
    if schema.structs.is_empty() {
        return Err(CompileError::NoStructs);
    }
    Ok(schema)
}

/// Parses and resolves schema files into one IR.
/// Returns `Err(CompileError::NoStructs)` when the files declare no struct.
pub fn compile_files<P: AsRef<Path>>(paths: &[P], config: &CompileConfig) -> Result<Schema, CompileError> {
    let files = parse_files(paths)?;
    require_structs(resolve(&files, config)?)
}

/// Same as [`compile_files`] for in-memory `(name, text)` sources.
pub fn compile_sources(sources: &[(&str, &str)], config: &CompileConfig) -> Result<Schema, CompileError> {
    let files = parse_sources(sources)?;
    require_structs(resolve(&files, config)?)
}

/// Compiles `paths` and writes the code of `backend` under `basedir`.
pub fn compile_with<P: AsRef<Path>>(
    paths: &[P],
    config: &CompileConfig,
    backend: &dyn Backend,
    basedir: &Path,
) -> Result<Vec<PathBuf>, CompileError> {
    let schema = compile_files(paths, config)?;
    let written = generate(&schema, backend, basedir)?;
    info!(
        language = backend.name(),
        packages = schema.packages.len(),
        files = written.len(),
        "generated code"
    );
    Ok(written)
}

/// Compiles `paths` for the named language, as the command line does.
pub fn compile_to<P: AsRef<Path>>(
    language: &str,
    paths: &[P],
    config: &CompileConfig,
    basedir: &Path,
) -> Result<Vec<PathBuf>, CompileError> {
    let backend = Language::from_name(language)?.backend()?;
    compile_with(paths, config, backend, basedir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn no_structs() {
        let err = compile_sources(&[("empty.colf", "package empty\n")], &CompileConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::NoStructs));
    }

    #[test]
    fn schema_errors_pass_through() {
        let err = compile_sources(
            &[("bad.colf", "package bad\nstruct s { x nope; }\n")],
            &CompileConfig::default(),
        )
        .unwrap_err();
        match err {
            CompileError::Schema(e) => {
                assert_eq!(e.file, Some(PathBuf::from("bad.colf")));
                assert_eq!(e.line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn compile_to_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("demo.colf");
        fs::write(&schema, "package demo\nstruct point { x int32; }\n").unwrap();

        let written = compile_to("go", &[&schema], &CompileConfig::default(), dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("demo/Colfer.go").is_file());
        assert!(dir.path().join("demo/Point.go").is_file());
    }

    #[test]
    fn unknown_language() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_to::<&Path>("cobol", &[], &CompileConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedLanguage(name) if name == "cobol"));

        let err = compile_to::<&Path>("js", &[], &CompileConfig::default(), dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "ECMAScript template not implemented yet");
    }

    #[test]
    fn missing_file() {
        let err = compile_files(&["does/not/exist.colf"], &CompileConfig::default()).unwrap_err();
        match err {
            CompileError::Schema(e) => {
                assert_eq!(e.file, Some(PathBuf::from("does/not/exist.colf")));
                assert_eq!(e.line, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
