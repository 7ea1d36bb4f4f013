//! YAML text → [`ConfigValue`], with `${NAME}` interpolation.
//!
//! Every call builds its own parser; nothing is registered globally.
//!
//! # Pipeline
//! 1. Parse with `serde_yaml` (YAML 1.2 core schema).
//! 2. On a *scanner* error, decode raw `\uXXXX` escapes as UTF-16 code units
//!    (joining surrogate pairs) and retry exactly once.
//! 3. Apply `<<` merge keys.
//! 4. Walk the tree: expand `${NAME}` in string scalars and keys, strip tags.
//!    Keys that render to the same text (`1` and `"1"`) are rejected.
//! 5. A null/empty document becomes an empty mapping.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_yaml::Value;
use tracing::{debug, warn};

use super::value::{ConfigMap, ConfigValue};
use crate::error::ConfigError;

/// Scalars are only interpolated when they contain this shape.
fn env_var_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{.*\}").expect("valid regex"))
}

/// `$NAME` or `${NAME}`; `NAME` is ASCII word characters in the bare form.
fn env_var_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$([A-Za-z0-9_]+|\{[^}]*\})").expect("valid regex"))
}

/// libyaml problems raised by the tokenizer rather than the parser.
const SCANNER_PROBLEMS: &[&str] = &[
    "while scanning",
    "while parsing a quoted scalar",
    "found character that cannot start any token",
    "found unknown escape character",
    "found invalid Unicode character escape code",
    "did not find expected hexdecimal number",
    "mapping values are not allowed in this context",
    "block sequence entries are not allowed in this context",
    "found a tab character",
    "found unexpected end of stream",
    "found unexpected document indicator",
    "did not find expected comment or line break",
    "could not find expected ':'",
    "control characters are not allowed",
];

/// Parse YAML text into a [`ConfigValue`].
///
/// Empty and comment-only documents yield an empty mapping, never `Null`.
pub fn load_yaml_text(content: &str) -> Result<ConfigValue, ConfigError> {
    if is_blank_document(content) {
        return Ok(ConfigValue::default());
    }

    let mut raw = match parse_document(content) {
        Ok(raw) => raw,
        Err(err) if is_scan_error(&err) => recover(content, err)?,
        Err(err) => return Err(syntax_error(&err)),
    };
    raw.apply_merge().map_err(|e| syntax_error(&e))?;

    let value = convert(raw)?;
    if value.is_null() {
        return Ok(ConfigValue::default());
    }
    Ok(value)
}

fn parse_document(content: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str::<Value>(content)
}

fn is_blank_document(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

fn is_scan_error(err: &serde_yaml::Error) -> bool {
    let message = err.to_string();
    SCANNER_PROBLEMS.iter().any(|p| message.contains(p))
}

/// Single retry after a scanner error. The caller always sees the original error.
fn recover(content: &str, original: serde_yaml::Error) -> Result<Value, ConfigError> {
    let transcoded = decode_unicode_escapes(content);
    if let Cow::Borrowed(_) = transcoded {
        return Err(scan_error(&original));
    }

    warn!(error = %original, "YAML scanner error, retrying with unicode escapes decoded");
    match parse_document(&transcoded) {
        Ok(raw) => {
            debug!("YAML recovered after unicode escape decoding");
            Ok(raw)
        }
        Err(retry) => {
            debug!(error = %retry, "YAML retry failed");
            Err(scan_error(&original))
        }
    }
}

fn location(err: &serde_yaml::Error) -> (Option<usize>, Option<usize>) {
    match err.location() {
        Some(loc) => (Some(loc.line()), Some(loc.column())),
        None => (None, None),
    }
}

fn syntax_error(err: &serde_yaml::Error) -> ConfigError {
    let (line, column) = location(err);
    ConfigError::SyntaxError {
        line,
        column,
        message: err.to_string(),
    }
}

fn scan_error(err: &serde_yaml::Error) -> ConfigError {
    let (line, column) = location(err);
    ConfigError::ScanError {
        line,
        column,
        message: err.to_string(),
    }
}

// ─────────────────────────────────────────────
// Unicode escape recovery
// ─────────────────────────────────────────────

/// Replace raw `\uXXXX` / `\UXXXXXXXX` escapes with the characters they name.
///
/// Escapes are read as UTF-16 code units so that `\ud83d\ude00` becomes a
/// single character; an unpaired surrogate becomes U+FFFD. A backslash only
/// starts an escape when it is preceded by an even number of backslashes.
/// Returns `Cow::Borrowed` when nothing was decoded.
pub(crate) fn decode_unicode_escapes(content: &str) -> Cow<'_, str> {
    if !content.contains("\\u") && !content.contains("\\U") {
        return Cow::Borrowed(content);
    }

    let mut out = String::with_capacity(content.len());
    let mut units: Vec<u16> = Vec::new();
    let mut decoded_any = false;
    let mut backslashes = 0usize;
    let mut rest = content;

    while let Some(c) = rest.chars().next() {
        if c == '\\' && backslashes % 2 == 0 {
            if let Some((code, len)) = parse_escape(&rest[1..]) {
                push_code_point(&mut units, code);
                decoded_any = true;
                backslashes = 0;
                rest = &rest[1 + len..];
                continue;
            }
        }

        flush_units(&mut units, &mut out);
        out.push(c);
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        rest = &rest[c.len_utf8()..];
    }
    flush_units(&mut units, &mut out);

    if decoded_any {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(content)
    }
}

/// Parse `uXXXX` or `UXXXXXXXX` at the start of `s`; returns (code, consumed).
fn parse_escape(s: &str) -> Option<(u32, usize)> {
    let digits = match s.as_bytes().first()? {
        b'u' => 4,
        b'U' => 8,
        _ => return None,
    };
    let hex = s.get(1..1 + digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let code = u32::from_str_radix(hex, 16).ok()?;
    if code > 0x10FFFF {
        return None;
    }
    Some((code, 1 + digits))
}

fn push_code_point(units: &mut Vec<u16>, code: u32) {
    match u16::try_from(code) {
        Ok(unit) => units.push(unit),
        Err(_) => {
            // Above the BMP and below 0x110000, so always a valid scalar value.
            if let Some(c) = char::from_u32(code) {
                let mut buf = [0u16; 2];
                units.extend_from_slice(c.encode_utf16(&mut buf));
            }
        }
    }
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(
        char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

// ─────────────────────────────────────────────
// Tree conversion + interpolation
// ─────────────────────────────────────────────

fn convert(value: Value) -> Result<ConfigValue, ConfigError> {
    let converted = match value {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::Integer(i),
            None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ConfigValue::String(interpolate(s)?),
        Value::Sequence(items) => ConfigValue::Sequence(
            items
                .into_iter()
                .map(convert)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(map) => {
            let mut out = ConfigMap::with_capacity(map.len());
            for (key, value) in map {
                let key = mapping_key(key)?;
                if out.contains_key(&key) {
                    return Err(ConfigError::SyntaxError {
                        line: None,
                        column: None,
                        message: format!("duplicate mapping key '{key}'"),
                    });
                }
                out.insert(key, convert(value)?);
            }
            ConfigValue::Mapping(out)
        }
        Value::Tagged(tagged) => convert(tagged.value)?,
    };
    Ok(converted)
}

/// Render a scalar key as text. Collection keys are rejected.
fn mapping_key(key: Value) -> Result<String, ConfigError> {
    match key {
        Value::String(s) => interpolate(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => mapping_key(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(ConfigError::SyntaxError {
            line: None,
            column: None,
            message: "unsupported non-scalar mapping key".to_string(),
        }),
    }
}

/// Expand environment variables in a scalar that contains `${...}`.
///
/// Unset variables are left in place and then reported together.
pub(crate) fn interpolate(value: String) -> Result<String, ConfigError> {
    if !env_var_shape().is_match(&value) {
        return Ok(value);
    }

    let expanded = env_var_reference().replace_all(&value, |caps: &Captures<'_>| {
        let token = &caps[1];
        let name = token
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(token);
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    if expanded.contains('$') {
        let names = expanded
            .split_whitespace()
            .filter(|word| word.contains('$'))
            .map(str::to_string)
            .collect();
        return Err(ConfigError::UnresolvedVariable { value, names });
    }

    Ok(expanded.into_owned())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
