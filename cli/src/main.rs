use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use brine_colf_compiler::{
    compile_with, format_file, CompileConfig, CompileError, Language, SchemaError,
};

/// Generates source code from Colfer schema definitions.
///
/// Operands name schema files or directories; directories are scanned for
/// `*.colf` files. With no operands the working directory is used.
#[derive(Parser, Debug)]
#[command(name = "colf", version, about, arg_required_else_help = true)]
struct Cli {
    /// Target language: rust, go or java
    language: String,

    /// Schema files and directories
    files: Vec<PathBuf>,

    /// Base directory for the generated code
    #[arg(short, long, default_value = ".")]
    basedir: PathBuf,

    /// Package prefix, with slash as the separator
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Upper limit for serial byte sizes, as a target language expression
    #[arg(short, long)]
    size_max: Option<String>,

    /// Upper limit for the number of elements in a list
    #[arg(short, long)]
    list_max: Option<String>,

    /// Normalize the format of the schema files in place
    #[arg(short, long)]
    format: bool,

    /// Log debug messages on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<CompileConfig, CompileError> {
        let mut config = CompileConfig::default().with_prefix(&self.prefix);
        if let Some(expr) = &self.size_max {
            config = config.with_size_max(expr)?;
        }
        if let Some(expr) = &self.list_max {
            config = config.with_list_max(expr)?;
        }
        Ok(config)
    }
}

fn read_error(path: &Path, msg: impl ToString) -> CompileError {
    SchemaError::new(msg.to_string(), 0, 0).in_file(path).into()
}

/// Expands directories into their `*.colf` files and drops duplicates,
/// keeping the first occurrence.
fn collect_files(operands: &[PathBuf]) -> Result<Vec<PathBuf>, CompileError> {
    let default = [PathBuf::from(".")];
    let operands = if operands.is_empty() { &default[..] } else { operands };

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for operand in operands {
        let found = if operand.is_dir() {
            let pattern = Path::new(&glob::Pattern::escape(&operand.to_string_lossy())).join("*.colf");
            let paths = glob::glob(&pattern.to_string_lossy()).map_err(|e| read_error(operand, e))?;
            let mut found = Vec::new();
            for entry in paths {
                found.push(entry.map_err(|e| read_error(operand, e))?);
            }
            found
        } else {
            vec![operand.clone()]
        };

        for path in found {
            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                files.push(path);
            } else {
                debug!(file = %path.display(), "duplicate schema file ignored");
            }
        }
    }
    Ok(files)
}

fn run(cli: &Cli) -> Result<(), CompileError> {
    let backend = Language::from_name(&cli.language)?.backend()?;
    let config = cli.config()?;
    let files = collect_files(&cli.files)?;

    if cli.format {
        for file in &files {
            if format_file(file)? {
                info!(file = %file.display(), "formatted schema file");
            }
        }
    }

    compile_with(&files, &config, backend, &cli.basedir)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("colf: {e}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "colf", "-b", "out", "-p", "com/example", "-s", "1024", "-l", "8", "-f", "-v", "Go", "a.colf", "b",
        ])
        .unwrap();
        assert_eq!(cli.language, "Go");
        assert_eq!(cli.files, [PathBuf::from("a.colf"), PathBuf::from("b")]);
        assert_eq!(cli.basedir, PathBuf::from("out"));
        assert!(cli.format && cli.verbose);

        let config = cli.config().unwrap();
        assert_eq!(config.prefix, "com/example");
        assert_eq!(config.size_max.evaluate(), Some(1024));
        assert_eq!(config.list_max.evaluate(), Some(8));
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["colf", "rust"]).unwrap();
        assert_eq!(cli.basedir, PathBuf::from("."));
        assert!(cli.files.is_empty());
        assert_eq!(cli.config().unwrap(), CompileConfig::default());
    }

    #[test]
    fn rejects_bad_limit() {
        let cli = Cli::try_parse_from(["colf", "-s", "1 +", "go"]).unwrap();
        assert!(matches!(cli.config(), Err(CompileError::LimitConfig(_))));
    }

    #[test]
    fn collects_directories_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.colf"), "package a\n").unwrap();
        fs::write(dir.path().join("b.colf"), "package b\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = collect_files(&[dir.path().to_path_buf(), dir.path().join("a.colf")]).unwrap();
        assert_eq!(files, [dir.path().join("a.colf"), dir.path().join("b.colf")]);
    }

    fn cli_for(dir: &Path, args: &[&str]) -> Cli {
        let basedir = dir.join("out");
        let mut argv = vec!["colf", "-b", basedir.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn schema_errors_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("bad.colf");
        fs::write(&schema, "package bad\nstruct s { x nope; }\n").unwrap();

        let cli = cli_for(dir.path(), &["rust", schema.to_str().unwrap()]);
        let err = run(&cli).unwrap_err();
        assert!(matches!(err, CompileError::Schema(_)));
        assert!(err.to_string().ends_with("The type \"nope\" is not defined for field \"x\""));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn format_rewrites_files_before_compiling() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("demo.colf");
        let original = "package demo\nstruct point {x int32;   label text;}\n";
        fs::write(&schema, original).unwrap();

        let cli = cli_for(dir.path(), &["-f", "rust", schema.to_str().unwrap()]);
        run(&cli).unwrap();

        let formatted = fs::read_to_string(&schema).unwrap();
        assert_ne!(formatted, original);
        assert_eq!(formatted, brine_colf_compiler::format_schema(original).unwrap());
        assert!(dir.path().join("out/demo/Point.rs").is_file());

        // a second run leaves the file alone
        run(&cli).unwrap();
        assert_eq!(fs::read_to_string(&schema).unwrap(), formatted);
    }

    #[test]
    fn format_stops_on_unparsable_files() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("broken.colf");
        let original = "package demo\nstruct point {x int32\n";
        fs::write(&schema, original).unwrap();

        let cli = cli_for(dir.path(), &["-f", "go", schema.to_str().unwrap()]);
        assert!(matches!(run(&cli), Err(CompileError::Schema(_))));
        assert_eq!(fs::read_to_string(&schema).unwrap(), original);
        assert!(!dir.path().join("out").exists());
    }
}
