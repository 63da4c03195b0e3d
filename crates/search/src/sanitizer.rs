//! Free-text query sanitizing for the engine's `query_string` syntax.
//!
//! Both functions are pure and total: any input, including the empty string,
//! produces an output.

/// Single-character tokens reserved by the query syntax.
const RESERVED_CHARS: &[char] = &[
    '+', '-', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', '\\', ':',
];

/// Keywords the engine binds as boolean operators when uppercase.
const BOOLEAN_KEYWORDS: &[&str] = &["AND", "OR", "NOT"];

/// Prefixes every reserved token in `raw` with a backslash.
///
/// Reserved tokens are `+ - && || ! ( ) { } [ ] ^ " ~ * ? \ :`. The operators
/// `&&` and `||` are escaped as a unit; a lone `&` or `|` passes through.
///
/// ```
/// use licence_finder_search::sanitizer::escape_special_characters;
///
/// assert_eq!(escape_special_characters("blargh"), "blargh");
/// assert_eq!(escape_special_characters("a+b"), "a\\+b");
/// assert_eq!(escape_special_characters("&&blargh"), "\\&&blargh");
/// ```
pub fn escape_special_characters(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + raw.len() / 4);
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if RESERVED_CHARS.contains(&c) {
            escaped.push('\\');
            escaped.push(c);
            continue;
        }

        if (c == '&' || c == '|') && chars.peek() == Some(&c) {
            chars.next();
            escaped.push('\\');
            escaped.push(c);
            escaped.push(c);
            continue;
        }

        escaped.push(c);
    }

    escaped
}

/// Lowercases a trailing `AND`, `OR` or `NOT` so the engine reads it as a
/// term instead of a dangling operator.
///
/// Only the last whitespace-separated word is considered, and only when it is
/// exactly one of the keywords. Trailing whitespace is preserved.
///
/// ```
/// use licence_finder_search::sanitizer::normalize_boolean_operators;
///
/// assert_eq!(normalize_boolean_operators("bleh AND"), "bleh and");
/// assert_eq!(normalize_boolean_operators("cats AND dogs"), "cats AND dogs");
/// ```
pub fn normalize_boolean_operators(raw: &str) -> String {
    let trimmed = raw.trim_end();
    let word_start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    let last_word = &trimmed[word_start..];
    if !BOOLEAN_KEYWORDS.contains(&last_word) {
        return raw.to_string();
    }

    let mut normalized = String::with_capacity(raw.len());
    normalized.push_str(&raw[..word_start]);
    normalized.push_str(&last_word.to_lowercase());
    normalized.push_str(&raw[trimmed.len()..]);
    normalized
}

/// Applies escaping and, when requested, boolean keyword normalization.
pub fn sanitize_query(raw: &str, normalize_operators: bool) -> String {
    let escaped = escape_special_characters(raw);
    if normalize_operators {
        normalize_boolean_operators(&escaped)
    } else {
        escaped
    }
}
