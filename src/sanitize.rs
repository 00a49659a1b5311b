//! Input sanitizers applied by callers before values are persisted.
//!
//! Total functions over string input: malformed values yield `None`, never an
//! error, so callers report validation failures uniformly instead of handling
//! exceptions. Unescaped input would otherwise end up verbatim in the JSON
//! documents and flow back out to whatever renders them.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_MESSAGE_MAX_LENGTH: usize = 5000;

lazy_static! {
    static ref SCRIPT_BLOCK: Regex =
        Regex::new(r"(?is)<script\b.*?</script>").expect("valid script-block pattern");
    static ref EMAIL: Regex = Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$"
    )
    .expect("valid email pattern");
}

/// Escape the HTML-significant characters the `validator` escape set covers.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim whitespace and HTML-escape a general string input.
pub fn sanitize_string(input: &str) -> String {
    escape_html(input.trim())
}

/// Normalize and validate an email address.
///
/// Trims, lowercases, and checks an RFC-ish shape (local part, domain with a
/// TLD). Returns the canonical form, or `None` if invalid.
pub fn sanitize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    if EMAIL.is_match(&normalized) {
        Some(normalized)
    } else {
        None
    }
}

/// Normalize and validate a phone number.
///
/// Strips non-digits, then recognizes Philippine mobile numbers:
/// `09XXXXXXXXX` is accepted as-is and `639XXXXXXXXX` is normalized to the
/// local `09…` form. Any other run of 10 to 15 digits is accepted verbatim;
/// everything else is rejected.
pub fn sanitize_phone(phone: &str) -> Option<String> {
    let cleaned: String = phone.chars().filter(char::is_ascii_digit).collect();

    if cleaned.len() == 11 && cleaned.starts_with("09") {
        return Some(cleaned);
    }

    if cleaned.len() == 12 && cleaned.starts_with("639") {
        return Some(format!("0{}", &cleaned[2..]));
    }

    if (10..=15).contains(&cleaned.len()) {
        return Some(cleaned);
    }

    None
}

/// Sanitize a free-text message or description.
///
/// Strips `<script>…</script>` blocks, trims, truncates to `max_length`
/// characters, and HTML-escapes the remainder.
pub fn sanitize_message(message: &str, max_length: usize) -> String {
    let stripped = SCRIPT_BLOCK.replace_all(message, "");
    let trimmed = stripped.trim();

    let truncated: String = if trimmed.chars().count() > max_length {
        trimmed.chars().take(max_length).collect()
    } else {
        trimmed.to_string()
    };

    escape_html(&truncated)
}

/// Sanitize the string leaves of a JSON value in place.
///
/// Covers top-level strings, string fields of objects, string elements of
/// arrays, and string fields one object level deeper, mirroring the shape of
/// a typical request body.
pub fn sanitize_json_value(value: &mut Value) {
    sanitize_value_depth(value, 2);
}

fn sanitize_value_depth(value: &mut Value, depth: u8) {
    match value {
        Value::String(s) => *s = sanitize_string(s),
        Value::Array(items) if depth > 0 => {
            for item in items {
                sanitize_value_depth(item, depth - 1);
            }
        }
        Value::Object(map) if depth > 0 => {
            for (_, field) in map.iter_mut() {
                sanitize_value_depth(field, depth - 1);
            }
        }
        _ => {}
    }
}
