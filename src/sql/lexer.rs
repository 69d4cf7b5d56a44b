//! Statement normalization and the group tokenizer.
//!
//! Tokenizing is a single left-to-right pass. Whitespace separates value
//! tokens; three openers trigger sub-scanners that consume a whole group
//! and emit one token: `(` (balanced parenthesis group), `'` or `"` (quote
//! group with `\` escaping the next character), and any symbol character
//! (maximal symbol run). A solitary `,` run is discarded: commas separate
//! list elements inside parenthesis-group bodies, which the parser splits
//! itself.
//!
//! Normalization runs first so the grammar never has to distinguish
//! `a = b`, `a=b`, and `a =b`. Both passes are quote-aware: whitespace and
//! separators inside string literals are left untouched.

use eyre::{bail, ensure, Result};

use super::token::{is_quote_char, is_symbol_char, Token};

/// Rewrites a statement into its canonical spacing: newlines become
/// spaces, whitespace runs collapse to one space, and blanks around `=`
/// and `,` disappear. Text inside quotes is preserved byte for byte.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if is_quote_char(c) {
            quote = Some(c);
            out.push(c);
            continue;
        }

        if c.is_whitespace() {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            let prev_absorbs = out.is_empty() || out.ends_with('=') || out.ends_with(',');
            let next_absorbs = matches!(chars.peek(), Some(&'=') | Some(&',') | None);
            if !prev_absorbs && !next_absorbs {
                out.push(' ');
            }
            continue;
        }

        out.push(c);
    }

    out
}

/// Splits a statement into group tokens.
pub fn tokenize(statement: &str) -> Result<Vec<Token>> {
    ensure!(
        statement.chars().any(|c| !c.is_whitespace()),
        "empty statement"
    );

    let normalized = normalize(statement);
    let chars: Vec<char> = normalized.chars().collect();

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '(' {
            flush_value(&mut current, &mut tokens);
            let (group, end) = capture_paren_group(&chars, i)?;
            tokens.push(Token::ParenGroup(group));
            i = end + 1;
        } else if is_quote_char(c) {
            flush_value(&mut current, &mut tokens);
            let (group, end) = capture_quote_group(&chars, i)?;
            tokens.push(Token::QuoteGroup(group));
            i = end + 1;
        } else if is_symbol_char(c) {
            flush_value(&mut current, &mut tokens);
            let (group, end) = capture_symbol_group(&chars, i);
            if group != "," {
                tokens.push(Token::SymbolGroup(group));
            }
            i = end + 1;
        } else if c == ' ' {
            flush_value(&mut current, &mut tokens);
            i += 1;
        } else {
            current.push(c);
            i += 1;
        }
    }

    flush_value(&mut current, &mut tokens);

    Ok(tokens)
}

fn flush_value(current: &mut String, tokens: &mut Vec<Token>) {
    if !current.is_empty() {
        tokens.push(Token::Value(std::mem::take(current)));
    }
}

/// Captures a balanced parenthesis group starting at `start` (which must
/// hold `(`). Returns the body without the outer parentheses and the index
/// of the closing parenthesis. Parentheses inside quoted text do not count
/// toward the balance.
fn capture_paren_group(chars: &[char], start: usize) -> Result<(String, usize)> {
    debug_assert_eq!(chars[start], '(');

    let mut captured = String::new();
    let mut depth = 1;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            captured.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                captured.push(c);
            }
            '(' => {
                depth += 1;
                captured.push(c);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((captured, i));
                }
                captured.push(c);
            }
            _ => captured.push(c),
        }
        i += 1;
    }

    bail!("unclosed parenthesis");
}

/// Captures a quote group starting at `start` (which must hold a quote).
/// The group closes on the same quote character that opened it; `\` takes
/// the next character literally. Returns the unescaped body and the index
/// of the closing quote.
fn capture_quote_group(chars: &[char], start: usize) -> Result<(String, usize)> {
    debug_assert!(is_quote_char(chars[start]));

    let opener = chars[start];
    let mut captured = String::new();
    let mut escaped = false;
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];

        if escaped {
            captured.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == opener {
            return Ok((captured, i));
        } else {
            captured.push(c);
        }
        i += 1;
    }

    bail!("unclosed quote");
}

/// Captures a maximal run of symbol characters starting at `start`.
/// Returns the run and the index of its last character.
fn capture_symbol_group(chars: &[char], start: usize) -> (String, usize) {
    debug_assert!(is_symbol_char(chars[start]));

    let mut captured = String::new();
    let mut i = start;

    while i < chars.len() && is_symbol_char(chars[i]) {
        captured.push(chars[i]);
        i += 1;
    }

    (captured, i - 1)
}
