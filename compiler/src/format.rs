//! Canonical layout for schema files. Comments survive; own-line comments
//! keep their place and trailing comments stay on their line.

use std::{fs, path::Path};

use tracing::debug;

use crate::{
    error::{CompileError, SchemaError},
    parser::parse_schema,
    tokenizer::{tokenize_schema, tokenize_with_comments, Token},
};

#[derive(Default)]
struct Printer {
    lines:       Vec<String>,
    // code tokens of the line being assembled
    cur:         Vec<String>,
    // comments met halfway a line
    pending:     Vec<String>,
    in_struct:   bool,
    need_blank:  bool,
    // source line of the last flushed token
    last_line:   usize,
}

impl Printer {
    fn indent(&self) -> &'static str {
        if self.in_struct {
            "\t"
        } else {
            ""
        }
    }

    fn blank(&mut self) {
        if self.need_blank && !self.in_struct {
            self.lines.push(String::new());
        }
        self.need_blank = false;
    }

    fn comment(&mut self, tok: &Token) {
        if !self.cur.is_empty() {
            self.pending.push(tok.text.clone());
        } else if !self.lines.is_empty() && tok.line == self.last_line {
            if let Some(last) = self.lines.last_mut() {
                last.push(' ');
                last.push_str(&tok.text);
            }
        } else {
            self.blank();
            let line = format!("{}{}", self.indent(), tok.text);
            self.lines.push(line);
        }
    }

    fn flush(&mut self, tok: &Token) {
        let line = match self.cur[0].as_str() {
            "}" => "}".to_string(),
            name if self.in_struct => format!("\t{} {}", name, self.cur[1..].concat()),
            "package" => format!("package {}", self.cur[1..].concat()),
            _ => format!("struct {} {{", self.cur[1]),
        };
        let opens = line.starts_with("struct ");
        let closes = line == "}";

        if opens {
            self.blank();
        }
        for c in std::mem::take(&mut self.pending) {
            let comment = format!("{}{}", self.indent(), c);
            self.lines.push(comment);
        }
        self.lines.push(line);
        self.cur.clear();
        self.last_line = tok.line;

        if opens {
            self.in_struct = true;
        }
        if closes {
            self.in_struct = false;
        }
        if closes || !self.in_struct {
            self.need_blank = true;
        }
    }
}

/// Formats schema text. Fails on text that does not parse.
pub fn format_schema(text: &str) -> Result<String, SchemaError> {
    parse_schema(&tokenize_schema(text)?)?;

    let mut p = Printer::default();
    let mut after_package_path = false;
    for tok in tokenize_with_comments(text)? {
        if tok.text.is_empty() {
            break;
        }
        if tok.is_comment() {
            p.comment(&tok);
            continue;
        }
        if std::mem::take(&mut after_package_path) && tok.text == ";" {
            // optional package terminator
            p.last_line = tok.line;
            continue;
        }

        p.cur.push(tok.text.clone());
        let first = p.cur[0].clone();
        match (first.as_str(), tok.text.as_str()) {
            ("package", t) if !p.in_struct && t != "package" => {
                p.flush(&tok);
                after_package_path = true;
            }
            ("struct", "{") | ("}", _) => p.flush(&tok),
            (_, ";") if p.in_struct => p.flush(&tok),
            _ => {}
        }
    }

    let mut out = p.lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Rewrites `path` in canonical layout and reports whether it changed.
pub fn format_file(path: &Path) -> Result<bool, CompileError> {
    let text = fs::read_to_string(path).map_err(|source| CompileError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let formatted = format_schema(&text).map_err(|e| e.in_file(path))?;
    if formatted == text {
        return Ok(false);
    }
    fs::write(path, &formatted).map_err(|source| CompileError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(file = %path.display(), "formatted schema file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_layout() {
        let text = "package   demo;\nstruct point{x int32;tags  [] text;}\nstruct   empty { }";
        assert_eq!(
            format_schema(text).unwrap(),
            "package demo\n\nstruct point {\n\tx int32;\n\ttags []text;\n}\n\nstruct empty {\n}\n"
        );
    }

    #[test]
    fn comments_are_kept() {
        let text = "// header\npackage demo // the package\n\n\n// a point\nstruct point { // open\n  // the x\n  x int32; // trailing\n}\n// end\n";
        let expect = "// header\npackage demo // the package\n\n// a point\nstruct point { // open\n\t// the x\n\tx int32; // trailing\n}\n\n// end\n";
        assert_eq!(format_schema(text).unwrap(), expect);
    }

    #[test]
    fn idempotent() {
        let text = "package a/b\n// one\nstruct s { n uint32; // n\n m []b; }\nstruct b {}\n";
        let once = format_schema(text).unwrap();
        assert_eq!(format_schema(&once).unwrap(), once);
    }

    #[test]
    fn rejects_invalid_schema() {
        assert!(format_schema("struct x {}").is_err());
    }

    #[test]
    fn format_file_reports_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.colf");
        fs::write(&path, "package x\nstruct y { z bool; }\n").unwrap();
        assert!(format_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "package x\n\nstruct y {\n\tz bool;\n}\n");
        assert!(!format_file(&path).unwrap());

        fs::write(&path, "package x\nstruct {").unwrap();
        match format_file(&path) {
            Err(CompileError::Schema(e)) => assert_eq!(e.file.as_deref(), Some(path.as_path())),
            other => panic!("unexpected {:?}", other),
        }
    }
}
