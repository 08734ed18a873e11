//! Size and list limit expressions.
//!
//! A limit is an expression in the target language, such as
//! `16 * 1024 * 1024` or `config.MaxSize`. It is emitted verbatim, so it is
//! validated against a small arithmetic grammar that every backend accepts.
//! Go binds `<<` as tightly as `*` while Rust and Java bind it below `+`, so
//! a shift never shares a parenthesis level with arithmetic operators.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::LimitConfigError;

pub const DEFAULT_SIZE_MAX: &str = "16 * 1024 * 1024";
pub const DEFAULT_LIST_MAX: &str = "64 * 1024";

lazy_static! {
    static ref LIMIT_TOKEN: Regex = Regex::new(
        r"\s+|0[xX][0-9a-fA-F_]+|[0-9][0-9_]*|[A-Za-z_][A-Za-z0-9_]*(?:(?:\.|::)[A-Za-z_][A-Za-z0-9_]*)*|<<|>>|[-+*/%()]"
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok<'a> {
    Number(u64),
    Name(&'a str),
    Op(&'a str),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LimitExpr {
    text: String,
}

impl LimitExpr {
    /// Validates `text`. `name` labels the limit in error messages.
    pub fn parse(name: &'static str, text: &str) -> Result<LimitExpr, LimitConfigError> {
        let fail = |reason: &str| LimitConfigError {
            name,
            expr: text.to_string(),
            reason: reason.to_string(),
        };

        let toks = lex(text).map_err(|r| fail(&r))?;
        if toks.is_empty() {
            return Err(fail("empty expression"));
        }

        let mut want_operand = true;
        let mut depth = 0usize;
        // (shift seen, arithmetic seen) per open parenthesis level
        let mut levels = vec![(false, false)];
        for tok in &toks {
            match tok {
                Tok::Number(_) | Tok::Name(_) => {
                    if !want_operand {
                        return Err(fail("missing operator"));
                    }
                    want_operand = false;
                }
                Tok::Open => {
                    if !want_operand {
                        return Err(fail("missing operator before \"(\""));
                    }
                    depth += 1;
                    levels.push((false, false));
                }
                Tok::Close => {
                    if want_operand || depth == 0 {
                        return Err(fail("unbalanced \")\""));
                    }
                    depth -= 1;
                    levels.pop();
                }
                Tok::Op(op) => {
                    if want_operand {
                        return Err(fail(&format!("missing operand before {:?}", op)));
                    }
                    want_operand = true;
                    if let Some((shift, arith)) = levels.last_mut() {
                        if matches!(*op, "<<" | ">>") {
                            *shift = true;
                        } else {
                            *arith = true;
                        }
                        if *shift && *arith {
                            return Err(fail("shift mixed with arithmetic, add parentheses"));
                        }
                    }
                }
            }
        }
        if want_operand {
            return Err(fail("missing operand at end"));
        }
        if depth != 0 {
            return Err(fail("unbalanced \"(\""));
        }

        let expr = LimitExpr { text: text.trim().to_string() };
        let constant = toks.iter().all(|t| !matches!(t, Tok::Name(_)));
        if constant && expr.evaluate().is_none() {
            return Err(fail("arithmetic overflow or division by zero"));
        }
        Ok(expr)
    }

    pub fn default_size_max() -> LimitExpr {
        LimitExpr { text: DEFAULT_SIZE_MAX.to_string() }
    }

    pub fn default_list_max() -> LimitExpr {
        LimitExpr { text: DEFAULT_LIST_MAX.to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The value of an expression made of literals only. `None` when it
    /// names anything the target language resolves.
    pub fn evaluate(&self) -> Option<u64> {
        let toks = lex(&self.text).ok()?;
        let mut pos = 0;
        let value = eval_shift(&toks, &mut pos)?;
        if pos == toks.len() {
            Some(value)
        } else {
            None
        }
    }

    pub fn evaluate_usize(&self) -> Option<usize> {
        self.evaluate().and_then(|v| usize::try_from(v).ok())
    }
}

impl fmt::Display for LimitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn lex(text: &str) -> Result<Vec<Tok<'_>>, String> {
    let mut toks = Vec::new();
    let mut last_end = 0;
    for mat in LIMIT_TOKEN.find_iter(text) {
        if mat.start() != last_end {
            return Err(format!("unexpected {:?}", &text[last_end..mat.start()]));
        }
        last_end = mat.end();
        let part = mat.as_str();
        let first = part.as_bytes()[0];
        let tok = if part.trim().is_empty() {
            continue;
        } else if part == "(" {
            Tok::Open
        } else if part == ")" {
            Tok::Close
        } else if first.is_ascii_digit() {
            let digits = part.replace('_', "");
            let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                u64::from_str_radix(hex, 16)
            } else {
                digits.parse::<u64>()
            };
            Tok::Number(parsed.map_err(|_| format!("invalid number {:?}", part))?)
        } else if first.is_ascii_alphabetic() || first == b'_' {
            Tok::Name(part)
        } else {
            Tok::Op(part)
        };
        toks.push(tok);
    }
    if last_end != text.len() {
        return Err(format!("unexpected {:?}", &text[last_end..]));
    }
    Ok(toks)
}

fn eval_shift(toks: &[Tok<'_>], pos: &mut usize) -> Option<u64> {
    let mut value = eval_sum(toks, pos)?;
    while let Some(Tok::Op(op @ ("<<" | ">>"))) = toks.get(*pos) {
        *pos += 1;
        let rhs = u32::try_from(eval_sum(toks, pos)?).ok()?;
        value = if *op == "<<" {
            let shifted = value.checked_shl(rhs)?;
            if shifted >> rhs != value {
                return None;
            }
            shifted
        } else {
            value.checked_shr(rhs)?
        };
    }
    Some(value)
}

fn eval_sum(toks: &[Tok<'_>], pos: &mut usize) -> Option<u64> {
    let mut value = eval_product(toks, pos)?;
    while let Some(Tok::Op(op @ ("+" | "-"))) = toks.get(*pos) {
        *pos += 1;
        let rhs = eval_product(toks, pos)?;
        value = if *op == "+" { value.checked_add(rhs)? } else { value.checked_sub(rhs)? };
    }
    Some(value)
}

fn eval_product(toks: &[Tok<'_>], pos: &mut usize) -> Option<u64> {
    let mut value = eval_atom(toks, pos)?;
    while let Some(Tok::Op(op @ ("*" | "/" | "%"))) = toks.get(*pos) {
        *pos += 1;
        let rhs = eval_atom(toks, pos)?;
        value = match *op {
            "*" => value.checked_mul(rhs)?,
            "/" => value.checked_div(rhs)?,
            _ => value.checked_rem(rhs)?,
        };
    }
    Some(value)
}

fn eval_atom(toks: &[Tok<'_>], pos: &mut usize) -> Option<u64> {
    let tok = toks.get(*pos)?;
    *pos += 1;
    match tok {
        Tok::Number(n) => Some(*n),
        Tok::Open => {
            let value = eval_shift(toks, pos)?;
            match toks.get(*pos) {
                Some(Tok::Close) => {
                    *pos += 1;
                    Some(value)
                }
                _ => None,
            }
        }
        _ => None,
    }
}
