//! Record tokenizer
//!
//! Splits on any character of the separator string and keeps empty tokens,
//! so `"A,,B"` yields `["A", "", "B"]`.

/// Field separators a record stream may use
pub const POSSIBLE_SEPARATORS: [&str; 10] = ["\t", ",", ";", "_", ":", "|", "#", "@", "$", " "];

/// Split `input` on every character found in `separators`.
///
/// Adjacent, leading and trailing delimiters produce empty tokens. An empty
/// separator string yields the whole input as a single token.
#[must_use]
pub fn tokenize(input: &str, separators: &str) -> Vec<String> {
    if separators.is_empty() {
        return vec![input.to_string()];
    }
    input
        .split(|c: char| separators.contains(c))
        .map(str::to_string)
        .collect()
}

/// Like [`tokenize`], but every delimiter is returned as a token of its own
/// directly after the token it terminates.
#[must_use]
pub fn tokenize_with_delims(input: &str, separators: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, c) in input.char_indices() {
        if separators.contains(c) {
            tokens.push(input[start..idx].to_string());
            tokens.push(c.to_string());
            start = idx + c.len_utf8();
        }
    }
    tokens.push(input[start..].to_string());
    tokens
}

/// Trim whitespace, then strip at most one leading and one trailing `"`.
///
/// The result is not trimmed again, so `"\" X \""` becomes `" X "`.
#[must_use]
pub fn trimmed_unquoted(token: &str) -> &str {
    let trimmed = token.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed)
}
