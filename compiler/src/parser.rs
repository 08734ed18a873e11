use std::{fs, path::{Path, PathBuf}};

use crate::{
    tokenizer::{tokenize_schema, Token},
    types::{Definition, Field, SchemaFile},
    utils::{error, quote},
    error::SchemaError,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref IDENTIFIER:       Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref PACKAGE_PATH:     Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:/[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
    static ref TYPE_NAME:        Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:/[A-Za-z_][A-Za-z0-9_]*)*(?:\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap();
    static ref SEMICOLON:        Regex = Regex::new(r"^;$").unwrap();
    static ref LEFT_BRACE:       Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:      Regex = Regex::new(r"^\}$").unwrap();
    static ref LIST_TOKEN:       Regex = Regex::new(r"^\[\]$").unwrap();
    static ref STRUCT_KEYWORD:   Regex = Regex::new(r"^struct$").unwrap();
    static ref PACKAGE_KEYWORD:  Regex = Regex::new(r"^package$").unwrap();
    static ref EOF:              Regex = Regex::new(r"^$").unwrap();
}

/// Parses the tokens of one schema file.
pub fn parse_schema(tokens: &[Token]) -> Result<SchemaFile, SchemaError> {
    let mut definitions = Vec::new();
    let mut index       = 0;

    fn current_token(tokens: &[Token], index: usize) -> Result<&Token, SchemaError> {
        tokens
            .get(index)
            .or_else(|| tokens.last())
            .ok_or_else(|| error("Unexpected end of tokens", 0, 0))
    }

    fn eat(tokens: &[Token], index: &mut usize, test: &Regex) -> Result<bool, SchemaError> {
        if test.is_match(&current_token(tokens, *index)?.text) {
            *index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect<'a>(tokens: &'a [Token], index: &mut usize, test: &Regex, expected: &str) -> Result<&'a Token, SchemaError> {
        let tok = current_token(tokens, *index)?;
        if !eat(tokens, index, test)? {
            return Err(error(
                &format!("Expected {} but found {}", expected, describe(tok)),
                tok.line,
                tok.column,
            ));
        }
        Ok(tok)
    }

    fn describe(tok: &Token) -> String {
        if tok.text.is_empty() {
            "end of file".to_string()
        } else {
            quote(&tok.text)
        }
    }

    // Handle package declaration
    let pkg_keyword = current_token(tokens, index)?;
    if !eat(tokens, &mut index, &PACKAGE_KEYWORD)? {
        return Err(error(
            &format!("Expected package clause but found {}", describe(pkg_keyword)),
            pkg_keyword.line,
            pkg_keyword.column,
        ));
    }
    let pkg_tok = expect(tokens, &mut index, &PACKAGE_PATH, "package path")?;
    eat(tokens, &mut index, &SEMICOLON)?;

    // Parse definitions one by one
    while !eat(tokens, &mut index, &EOF)? {
        let tok = current_token(tokens, index)?;
        if PACKAGE_KEYWORD.is_match(&tok.text) {
            return Err(error("Duplicate package clause", tok.line, tok.column));
        }
        if !eat(tokens, &mut index, &STRUCT_KEYWORD)? {
            return Err(error(
                &format!("Unexpected token {}", describe(tok)),
                tok.line,
                tok.column,
            ));
        }

        // Definition name
        let name_tok = expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
        expect(tokens, &mut index, &LEFT_BRACE, "\"{\"")?;

        // Collect fields
        let mut fields = Vec::new();
        while !eat(tokens, &mut index, &RIGHT_BRACE)? {
            // Field name
            let f_tok = expect(tokens, &mut index, &IDENTIFIER, "field name")?;

            // Field type, optionally a list
            let is_list = eat(tokens, &mut index, &LIST_TOKEN)?;
            let nested = current_token(tokens, index)?;
            if is_list && LIST_TOKEN.is_match(&nested.text) {
                return Err(error("Nested lists are not supported", nested.line, nested.column));
            }
            let t_tok = expect(tokens, &mut index, &TYPE_NAME, "type")?;

            expect(tokens, &mut index, &SEMICOLON, "\";\"")?;

            fields.push(Field {
                name:    f_tok.text.clone(),
                line:    f_tok.line,
                column:  f_tok.column,
                type_:   t_tok.text.clone(),
                is_list,
            });
        }

        definitions.push(Definition {
            name:    name_tok.text.clone(),
            line:    name_tok.line,
            column:  name_tok.column,
            fields,
        });
    }

    Ok(SchemaFile {
        path:    None,
        package: pkg_tok.text.clone(),
        line:    pkg_tok.line,
        column:  pkg_tok.column,
        definitions,
    })
}

/// Reads, tokenizes and parses one schema file. Every error carries the path.
pub fn parse_file(path: &Path) -> Result<SchemaFile, SchemaError> {
    let text = fs::read_to_string(path)
        .map_err(|e| SchemaError::new(e.to_string(), 0, 0).in_file(path))?;
    let tokens = tokenize_schema(&text).map_err(|e| e.in_file(path))?;
    let mut file = parse_schema(&tokens).map_err(|e| e.in_file(path))?;
    file.path = Some(path.to_path_buf());
    debug!(
        file = %path.display(),
        package = %file.package,
        structs = file.definitions.len(),
        "parsed schema file"
    );
    Ok(file)
}

/// Parses every file, stopping at the first error.
pub fn parse_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SchemaFile>, SchemaError> {
    paths.iter().map(|p| parse_file(p.as_ref())).collect()
}

/// Convenience for in-memory sources, as `(name, text)` pairs.
pub fn parse_sources(sources: &[(&str, &str)]) -> Result<Vec<SchemaFile>, SchemaError> {
    sources
        .iter()
        .map(|(name, text)| {
            let tokens = tokenize_schema(text).map_err(|e| e.in_file(*name))?;
            let mut file = parse_schema(&tokens).map_err(|e| e.in_file(*name))?;
            file.path = Some(PathBuf::from(*name));
            Ok(file)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<SchemaFile, SchemaError> {
        parse_schema(&tokenize_schema(text)?)
    }

    #[test]
    fn parses_package_and_structs() {
        let file = parse(
            "package demo/api;\n\
             struct course {\n\
             \tname text;\n\
             \tstudents []student;\n\
             }\n\
             struct student { id uint64; owner other.user; }\n",
        )
        .unwrap();
        assert_eq!(file.package, "demo/api");
        assert_eq!(file.definitions.len(), 2);
        let course = &file.definitions[0];
        assert_eq!(course.name, "course");
        assert_eq!(course.line, 2);
        assert_eq!(course.fields[0].name, "name");
        assert_eq!(course.fields[0].type_, "text");
        assert!(!course.fields[0].is_list);
        assert_eq!(course.fields[1].type_, "student");
        assert!(course.fields[1].is_list);
        assert_eq!(file.definitions[1].fields[1].type_, "other.user");
    }

    #[test]
    fn package_semicolon_is_optional() {
        assert_eq!(parse("package demo").unwrap().package, "demo");
        assert!(parse("package demo\n").unwrap().definitions.is_empty());
    }

    #[test]
    fn requires_package_clause() {
        let err = parse("struct a {}").unwrap_err();
        assert_eq!((err.line, err.column), (1, 1));
        assert!(err.msg.contains("package"), "{}", err.msg);

        let err = parse("").unwrap_err();
        assert!(err.msg.contains("end of file"), "{}", err.msg);
    }

    #[test]
    fn rejects_second_package_clause() {
        let err = parse("package a\nstruct x {}\npackage b\n").unwrap_err();
        assert_eq!(err.msg, "Duplicate package clause");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn rejects_nested_lists() {
        let err = parse("package a\nstruct x { m [][]uint32; }").unwrap_err();
        assert_eq!(err.msg, "Nested lists are not supported");
    }

    #[test]
    fn reports_missing_semicolon() {
        let err = parse("package a\nstruct x { m uint32 }").unwrap_err();
        assert_eq!(err.msg, "Expected \";\" but found \"}\"");
        assert_eq!((err.line, err.column), (2, 21));
    }

    #[test]
    fn reports_unterminated_struct() {
        let err = parse("package a\nstruct x { m uint32;").unwrap_err();
        assert_eq!(err.msg, "Expected field name but found end of file");
    }

    #[test]
    fn sources_carry_their_name() {
        let err = parse_sources(&[("a.colf", "package a"), ("b.colf", "struct")]).unwrap_err();
        assert_eq!(err.file, Some(PathBuf::from("b.colf")));
    }
}
