//! Scalar encoders for values the processor length- and charset-checks.

use once_cell::sync::Lazy;
use regex::Regex;

const ORDER_ID_MAX_LENGTH: usize = 22;
pub const BILL_TO_PHONE_MAX_DIGITS: usize = 14;

#[allow(clippy::expect_used)]
static ORDER_ID_ILLEGAL_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^,$@&\- \w]").expect("order id pattern is valid"));

/// Longest prefix of `value` whose UTF-8 length fits in `byte_length` bytes.
/// Never splits a multi-byte character.
pub fn byte_limit(value: impl ToString, byte_length: usize) -> String {
    let value = value.to_string();
    let mut end = 0;
    for (index, character) in value.char_indices() {
        let next = index + character.len_utf8();
        if next > byte_length {
            break;
        }
        end = next;
    }
    value.get(..end).map(ToOwned::to_owned).unwrap_or_default()
}

/// Address fields cannot contain `% | ^ \ /`.
pub fn format_address_field(value: Option<&str>) -> Option<String> {
    value.map(|value| value.replace(['%', '|', '^', '\\', '/'], ""))
}

/// Formatted and byte limited address field; absent input yields an empty value.
pub fn address_field(value: Option<&str>, byte_length: usize) -> String {
    byte_limit(format_address_field(value).unwrap_or_default(), byte_length)
}

/// Order ids accept letters, digits, `, $ @ & -` and non-leading spaces, up to 22 characters.
pub fn format_order_id(order_id: &str) -> String {
    let order_id = order_id.replace('.', "-");
    let order_id = ORDER_ID_ILLEGAL_CHARACTERS.replace_all(&order_id, "");
    ascii_word_chars(order_id.trim_start())
        .chars()
        .take(ORDER_ID_MAX_LENGTH)
        .collect()
}

// `\w` is Unicode aware; the processor only takes ASCII word characters.
fn ascii_word_chars(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '$' | '@' | '&' | '-' | ' '))
        .collect::<String>()
        .trim_start()
        .to_string()
}

/// Digits of a phone number, optionally capped.
pub fn format_phone(phone: &str, max_digits: Option<usize>) -> String {
    let digits = phone.chars().filter(char::is_ascii_digit);
    match max_digits {
        Some(limit) => digits.take(limit).collect(),
        None => digits.collect(),
    }
}

/// First `length` characters of `value`.
pub fn truncate_chars(value: &str, length: usize) -> String {
    value.chars().take(length).collect()
}
