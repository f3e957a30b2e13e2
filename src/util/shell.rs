//! Quoting for values written into generated shell scripts
//!
//! Option fragments end up inside `export JAVA_OPTS="..."` in a profile.d
//! script, and start commands later expand `$JAVA_OPTS` under `eval`. A literal
//! value therefore passes through two shell parses: the double-quoted export
//! when the script is sourced, then word splitting under `eval`.

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | ':' | '/' | '=' | '@' | '%' | '+')
}

/// Single-quotes `value` unless it is made only of characters `eval` leaves alone
pub fn quote_for_eval(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_plain) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Escapes the characters that are special inside a double-quoted string
pub fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes `\` and `"` only, leaving `$VAR` and `$(...)` to expand when sourced
pub fn escape_quotes(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}

/// A value that must reach the JVM unchanged through both parses
pub fn literal(value: &str) -> String {
    escape_double_quoted(&quote_for_eval(value))
}
