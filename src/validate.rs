//! Structural check of a [`ContextMap`] before it reaches a template.
//!
//! Only the presence of top-level keys is checked. Nested fields are whatever
//! the template dereferences; a missing nested field surfaces later as a
//! template error, not here.

use crate::context::ContextMap;
use crate::error::ValidationError;

/// Top-level keys every ticket template relies on.
pub const REQUIRED_CONTEXT_KEYS: [&str; 11] = [
    "i18n",
    "route",
    "ticket",
    "passenger",
    "payment",
    "departure",
    "arrival",
    "timeline",
    "qr_data_uri",
    "deep_link",
    "status_chip",
];

/// Fail with every missing key at once, sorted.
pub fn validate(context: &ContextMap) -> Result<(), ValidationError> {
    let mut missing: Vec<String> = REQUIRED_CONTEXT_KEYS
        .iter()
        .filter(|key| !context.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort_unstable();
    log::debug!("context validation failed: {missing:?}");
    Err(ValidationError { missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use serde_json::Value;

    fn full_map() -> ContextMap {
        build_context().to_map().unwrap()
    }

    #[test]
    fn complete_context_passes() {
        assert!(validate(&full_map()).is_ok());
    }

    #[test]
    fn extra_keys_are_ignored() {
        let mut map = full_map();
        map.insert("unused".to_string(), Value::Bool(true));
        assert!(validate(&map).is_ok());
    }

    #[test]
    fn reports_every_missing_key_sorted() {
        let mut map = full_map();
        for key in ["timeline", "deep_link", "route"] {
            map.remove(key);
        }
        let err = validate(&map).unwrap_err();
        assert_eq!(err.missing, vec!["deep_link", "route", "timeline"]);
    }

    #[test]
    fn empty_context_reports_all_keys() {
        let err = validate(&ContextMap::new()).unwrap_err();
        let mut expected: Vec<String> =
            REQUIRED_CONTEXT_KEYS.iter().map(|k| k.to_string()).collect();
        expected.sort();
        assert_eq!(err.missing, expected);
    }

    #[test]
    fn every_single_key_removal_is_detected() {
        for key in REQUIRED_CONTEXT_KEYS {
            let mut map = full_map();
            map.remove(key);
            let err = validate(&map).unwrap_err();
            assert_eq!(err.missing, vec![key.to_string()]);
        }
    }

    #[test]
    fn nested_shape_is_not_checked() {
        let mut map = full_map();
        map.insert("route".to_string(), Value::Null);
        assert!(validate(&map).is_ok());
    }
}
