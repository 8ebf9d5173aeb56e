//! Read-only query validation
//!
//! This is a denylist, not a parser. Literal contents are blanked out
//! before any check runs, so text inside `'...'` can neither trigger nor
//! hide a rejection.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::RejectReason;

static MUTATING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|merge|truncate|drop|alter|create|exec|execute|grant|revoke)\b",
    )
    .expect("mutating keyword pattern")
});

const COMMENT_MARKERS: [&str; 3] = ["--", "/*", "*/"];

/// Check that `query` is a single read-only statement.
///
/// Checks run in a fixed order and the first failure wins: empty, statement
/// separator, comment marker, leading keyword, mutating keyword.
pub fn validate_read_only(query: &str) -> Result<(), RejectReason> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(RejectReason::QueryRequired);
    }

    let code = strip_string_literals(trimmed);

    if code.contains(';') {
        return Err(RejectReason::MultiStatement);
    }
    if COMMENT_MARKERS.iter().any(|m| code.contains(m)) {
        return Err(RejectReason::CommentsNotAllowed);
    }

    let lower = code.trim_start().to_ascii_lowercase();
    if !starts_with_keyword(&lower, "select") && !starts_with_keyword(&lower, "with") {
        return Err(RejectReason::NotReadOnly);
    }
    if MUTATING_KEYWORD.is_match(&code) {
        return Err(RejectReason::NotReadOnly);
    }

    Ok(())
}

/// Replace the contents of every single-quoted literal with spaces.
///
/// The quotes themselves are kept and a doubled `''` inside a literal is
/// treated as an escaped quote. An unterminated literal blanks everything
/// to the end of the text. Output length equals input length in chars.
pub fn strip_string_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_literal = false;

    while let Some(c) = chars.next() {
        if !in_literal {
            out.push(c);
            if c == '\'' {
                in_literal = true;
            }
            continue;
        }
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push_str("  ");
            } else {
                out.push(c);
                in_literal = false;
            }
        } else {
            out.push(' ');
        }
    }
    out
}

fn starts_with_keyword(lower: &str, keyword: &str) -> bool {
    match lower.strip_prefix(keyword) {
        Some(rest) => !rest.starts_with(is_identifier_char),
        None => false,
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}
