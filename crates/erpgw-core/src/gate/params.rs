//! Parameter normalization and binding order

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::RejectReason;
use crate::value::SqlValue;

/// Row-count and offset controls. A parameter in one of these positions
/// must bind as an integer even when the client sent it as a string.
static INTEGER_POSITIONS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\boffset\s+@([a-z_][a-z0-9_]*)\s+rows\b").expect("offset pattern"),
        Regex::new(r"(?i)\bfetch\s+next\s+@([a-z_][a-z0-9_]*)\s+rows\s+only\b")
            .expect("fetch pattern"),
        Regex::new(r"(?i)\btop\s*\(\s*@([a-z_][a-z0-9_]*)\s*\)").expect("top pattern"),
    ]
});

/// Names (lower-cased, without `@`) of parameters used as row-count or
/// offset controls in `query`. Runs on the original, unstripped text.
pub fn detect_integer_params(query: &str) -> HashSet<String> {
    INTEGER_POSITIONS
        .iter()
        .flat_map(|re| re.captures_iter(query))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Parse `raw` only if it is a plain signed decimal integer
/// (optional sign, digits only, surrounding whitespace ignored).
pub fn parse_plain_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Convert one JSON parameter value to a bindable scalar.
///
/// Integral numbers become `Int`. Strings stay strings unless the parameter
/// is integer-hinted and the string is a plain integer, so a zero-padded
/// code like `"007"` is only ever converted in a row-count position.
/// Arrays and objects bind as their JSON text.
pub fn normalize_param_value(value: &Value, integer_hinted: bool) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return SqlValue::Int(i);
            }
            match n.as_f64() {
                Some(f) if is_integral_i64(f) => SqlValue::Int(f as i64),
                Some(f) => SqlValue::Float(f),
                None => SqlValue::Text(n.to_string()),
            }
        }
        Value::String(s) => match parse_plain_int(s).filter(|_| integer_hinted) {
            Some(i) => SqlValue::Int(i),
            None => SqlValue::Text(s.clone()),
        },
        other => SqlValue::Text(other.to_string()),
    }
}

fn is_integral_i64(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Strip one leading `@` and check the rest is a plain identifier
pub fn clean_param_name(raw: &str) -> Result<&str, RejectReason> {
    let name = raw.strip_prefix('@').unwrap_or(raw);
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(RejectReason::InvalidParameterName)
    }
}

/// Normalize and order all request parameters for binding.
///
/// Output is sorted by the name as supplied, with the `@` sigil removed.
/// Two keys that collapse to the same name (`a` and `@a`) are rejected.
pub fn bind_params(
    params: &Map<String, Value>,
    integer_hints: &HashSet<String>,
) -> Result<Vec<(String, SqlValue)>, RejectReason> {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let mut seen = BTreeSet::new();
    let mut bound = Vec::with_capacity(keys.len());
    for key in keys {
        let name = clean_param_name(key)?;
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(RejectReason::InvalidParameterName);
        }
        let hinted = integer_hints.contains(&name.to_ascii_lowercase());
        bound.push((name.to_string(), normalize_param_value(&params[key], hinted)));
    }
    Ok(bound)
}
