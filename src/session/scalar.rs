//! Scalar classification for session text tokens.
//!
//! The session blob carries no type annotations, so every value token is
//! classified by shape. Order matters: quoted strings bypass numeric
//! inference entirely (`"007"` stays a string, with its padding), and integer
//! parsing is attempted before float so `120000` comes out as an integer.

use super::SessionValue;

/// Classify one trimmed token into a typed scalar.
///
/// Rules, in order:
/// - empty token is null
/// - a token wrapped in matching double quotes is a string, quotes stripped,
///   with no escape processing
/// - exactly `true` / `false` (case-sensitive) is a boolean
/// - a decimal integer within the `i64` range is an integer
/// - anything `f64` can parse is a float
/// - everything else is a verbatim string
pub fn classify(token: &str) -> SessionValue {
    if token.is_empty() {
        return SessionValue::Null;
    }

    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return SessionValue::String(token[1..token.len() - 1].to_string());
    }

    match token {
        "true" => return SessionValue::Bool(true),
        "false" => return SessionValue::Bool(false),
        _ => {}
    }

    // i64/f64 parsing accepts an optional sign followed by decimal digits
    // only, which also rejects hex-prefixed tokens like `0x1A`.
    if let Ok(int_value) = token.parse::<i64>() {
        return SessionValue::Int(int_value);
    }
    if let Ok(float_value) = token.parse::<f64>() {
        return SessionValue::Float(float_value);
    }

    SessionValue::String(token.to_string())
}
