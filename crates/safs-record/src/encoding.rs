//! Self-describing multi-value encoding
//!
//! A list of values is flattened to one string whose first character is the
//! delimiter: `["A", "B"]` becomes `",A,B"`. The delimiter is picked so that
//! it does not occur in any of the values; lists that contain every candidate
//! cannot be encoded.

use crate::error::RecordError;

/// Delimiters tried in order when encoding
pub const SEPARATOR_CANDIDATES: [char; 7] = [',', '|', ':', ';', '_', '#', '!'];

/// First candidate delimiter that occurs in none of `values`, or `None`
/// when every candidate occurs somewhere
#[must_use]
pub fn unique_separator<S: AsRef<str>>(values: &[S]) -> Option<char> {
    SEPARATOR_CANDIDATES
        .into_iter()
        .find(|sep| !values.iter().any(|value| value.as_ref().contains(*sep)))
}

/// Encode `values` as `sep v1 sep v2 ...`; an empty list encodes to `""`
///
/// # Errors
/// [`RecordError::NoUniqueSeparator`] when every candidate delimiter occurs
/// in some value.
pub fn encode_multi_value<S: AsRef<str>>(values: &[S]) -> Result<String, RecordError> {
    let sep = unique_separator(values).ok_or(RecordError::NoUniqueSeparator)?;
    Ok(values.iter().fold(String::new(), |mut acc, value| {
        acc.push(sep);
        acc.push_str(value.as_ref());
        acc
    }))
}

/// Split an encoded string on its leading delimiter
#[must_use]
pub fn decode_multi_value(encoded: &str) -> Vec<String> {
    let mut chars = encoded.chars();
    match chars.next() {
        Some(sep) => chars.as_str().split(sep).map(str::to_string).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_plain_values_use_comma() {
        assert_eq!(encode_multi_value(&["A", "B"]).unwrap(), ",A,B");
    }

    #[test]
    fn test_delimiter_avoids_embedded_values() {
        let values = ["A", "B,C"];
        let encoded = encode_multi_value(&values).unwrap();
        let sep = encoded.chars().next().unwrap();
        assert_eq!(sep, '|');
        assert!(values.iter().all(|v| !v.contains(sep)));
        assert_eq!(decode_multi_value(&encoded), vec!["A", "B,C"]);
    }

    #[test]
    fn test_delimiter_at_start_of_value_is_avoided() {
        // a value starting with the candidate must still disqualify it
        assert_eq!(unique_separator(&[",lead", "x"]), Some('|'));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(encode_multi_value::<&str>(&[]).unwrap(), "");
        assert!(decode_multi_value("").is_empty());
    }

    #[test]
    fn test_single_empty_value() {
        assert_eq!(encode_multi_value(&[""]).unwrap(), ",");
        assert_eq!(decode_multi_value(","), vec![""]);
    }

    #[test]
    fn test_every_candidate_taken_is_refused() {
        let values = ["a,|:;_#!", "b"];
        assert_eq!(unique_separator(&values), None);
        assert_eq!(encode_multi_value(&values), Err(RecordError::NoUniqueSeparator));

        // spread across values counts the same
        let spread = [",|:", ";_", "#!"];
        assert_eq!(encode_multi_value(&spread), Err(RecordError::NoUniqueSeparator));
    }

    proptest! {
        #[test]
        fn prop_decode_restores_values(values in prop::collection::vec("[a-z,|:;_#]{0,6}", 1..6)) {
            let encoded = encode_multi_value(&values).unwrap();
            let sep = encoded.chars().next().unwrap();
            prop_assert!(values.iter().all(|v| !v.contains(sep)));
            prop_assert_eq!(decode_multi_value(&encoded), values);
        }
    }
}
