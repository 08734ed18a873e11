use std::path::PathBuf;

use serde::Serialize;

/// One parsed schema file, before name resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaFile {
    pub path:        Option<PathBuf>,
    pub package:     String,
    pub line:        usize,
    pub column:      usize,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    pub type_:   String,
    pub is_list: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    pub fields:  Vec<Field>,
}
