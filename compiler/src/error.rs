use std::{fmt, path::PathBuf};

use thiserror::Error;

/// A parse or validation failure in the schema input. Always fatal for the
/// whole compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub file:   Option<PathBuf>,
    pub line:   usize,
    pub column: usize,
    pub msg:    String,
}

impl SchemaError {
    pub fn new(msg: impl Into<String>, line: usize, column: usize) -> Self {
        SchemaError {
            file: None,
            line,
            column,
            msg: msg.into(),
        }
    }

    /// Attaches the file name, unless one is set already.
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        if self.file.is_none() {
            self.file = Some(file.into());
        }
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut located = false;
        if let Some(file) = &self.file {
            write!(f, "{}:", file.display())?;
            located = true;
        }
        if self.line != 0 {
            write!(f, "{}:{}:", self.line, self.column)?;
            located = true;
        }
        if located {
            f.write_str(" ")?;
        }
        f.write_str(&self.msg)
    }
}

impl std::error::Error for SchemaError {}

/// A size or list limit expression that can not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {name} expression {expr:?}: {reason}")]
pub struct LimitConfigError {
    pub name:   &'static str,
    pub expr:   String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    LimitConfig(#[from] LimitConfigError),

    #[error("write {}: {source}", path.display())]
    GenerationIo {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported language {0:?}")]
    UnsupportedLanguage(String),

    #[error("{0} template not implemented yet")]
    NotImplemented(&'static str),

    #[error("no struct definitions found")]
    NoStructs,

    #[error("format {}: {source}", path.display())]
    Format {
        path:   PathBuf,
        source: std::io::Error,
    },
}
