//! Converting raw form submissions into JSON objects.
//!
//! Browsers post `application/x-www-form-urlencoded` bodies where every value
//! is a string. The field rules coerce numbers and booleans from strings, so
//! the decoded map can be handed straight to a validator.

use serde_json::{Map, Value};

/// Build an object from decoded `(key, value)` pairs.
///
/// A key submitted more than once keeps its last value.
pub fn from_pairs<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect()
}

/// Decode a URL-encoded body or query string.
///
/// # Errors
///
/// Returns the decoding error if `input` is not valid URL encoding.
pub fn from_urlencoded(input: &str) -> Result<Map<String, Value>, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)?;
    Ok(from_pairs(pairs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_value_wins() {
        let map = from_pairs([("intent", "login"), ("email", "a@b.co"), ("email", "c@d.co")]);
        assert_eq!(Value::Object(map), json!({ "intent": "login", "email": "c@d.co" }));
    }

    #[test]
    fn test_urlencoded_body() {
        let map = from_urlencoded("intent=change-theme&theme=dark&note=a%20b+c").unwrap();
        assert_eq!(map["theme"], "dark");
        assert_eq!(map["note"], "a b c");
    }

    #[test]
    fn test_empty_body() {
        assert!(from_urlencoded("").unwrap().is_empty());
    }
}
