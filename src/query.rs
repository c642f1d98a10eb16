use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

///
/// Reduces a raw query string to its canonical signature: a SHA-256 hex
/// digest over the percent-decoded key/value pairs, independent of parameter
/// order and of how the values were encoded on the wire. An empty query
/// canonicalizes to the empty string.
///
/// Repeated keys collapse to the last value per key.
///
/// ## Example
///
/// ```
/// use mimic::canonicalize;
///
/// assert_eq!(canonicalize("a=1&b=2"), canonicalize("b=2&a=1"));
/// assert_eq!(canonicalize("greeting=hi%20you"), canonicalize("greeting=hi+you"));
/// assert_eq!(canonicalize(""), "");
/// ```
///
pub fn canonicalize(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    match serde_urlencoded::from_str::<BTreeMap<String, String>>(query) {
        Ok(pairs) => canonicalize_pairs(&pairs),
        // Undecodable queries hash as-is. Save and lookup go through the
        // same path, so the signatures still line up.
        Err(_) => hex::encode(Sha256::digest(query.as_bytes())),
    }
}

///
/// Same as `canonicalize`, for a query that was already parsed into a
/// key/value mapping.
///
pub fn canonicalize_pairs(pairs: &BTreeMap<String, String>) -> String {
    if pairs.is_empty() {
        return String::new();
    }

    // Length-prefixed so that ("a", "b=c") and ("a=b", "c") can't collide.
    let mut hasher = Sha256::new();
    for (key, value) in pairs {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{canonicalize, canonicalize_pairs};

    #[test]
    fn empty_query_has_empty_signature() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize_pairs(&BTreeMap::new()), "");
    }

    #[test]
    fn signature_is_order_invariant() {
        assert_eq!(canonicalize("a=1&b=2"), canonicalize("b=2&a=1"));
    }

    #[test]
    fn signature_is_encoding_invariant() {
        let plain = canonicalize_pairs(&BTreeMap::from([(
            "greeting".to_string(),
            "hi you".to_string(),
        )]));

        assert_eq!(canonicalize("greeting=hi%20you"), plain);
        assert_eq!(canonicalize("greeting=hi+you"), plain);
    }

    #[test]
    fn different_mappings_have_different_signatures() {
        assert_ne!(canonicalize("a=1"), canonicalize("a=2"));
        assert_ne!(canonicalize("a=1"), canonicalize("b=1"));
        assert_ne!(canonicalize("a=1"), canonicalize("a=1&b=2"));
    }

    #[test]
    fn key_value_boundaries_are_unambiguous() {
        assert_ne!(canonicalize("a=bc"), canonicalize("ab=c"));
    }

    #[test]
    fn repeated_keys_collapse_to_the_last_value() {
        assert_eq!(canonicalize("a=1&a=2"), canonicalize("a=2"));
    }
}
