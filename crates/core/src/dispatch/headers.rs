//! Layered header merge

use digirest_domain::Pairs;

/// Merge header layers in order.
///
/// A later layer overrides an earlier one when the names match exactly
/// (case-sensitive). The overridden header keeps the position where its name
/// first appeared; new names are appended.
pub fn merge_headers(layers: &[&[(String, String)]]) -> Pairs {
    let mut merged: Pairs = Vec::new();
    for layer in layers {
        for (name, value) in layer.iter() {
            match merged.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1.clone_from(value),
                None => merged.push((name.clone(), value.clone())),
            }
        }
    }
    merged
}

/// Value of a merged header, matched case-sensitively
pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Pairs {
        items.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_later_layers_override_in_place() {
        let base = pairs(&[("Authorization", "Bearer t"), ("Accept", "application/json")]);
        let defaults = pairs(&[("X-App", "demo"), ("Accept", "text/csv")]);
        let call = pairs(&[("X-App", "override")]);

        let merged = merge_headers(&[&base, &defaults, &call]);

        assert_eq!(
            merged,
            pairs(&[("Authorization", "Bearer t"), ("Accept", "text/csv"), ("X-App", "override")])
        );
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let merged = merge_headers(&[
            &pairs(&[("Accept", "application/json")]),
            &pairs(&[("accept", "text/csv")]),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(header_value(&merged, "Accept"), Some("application/json"));
        assert_eq!(header_value(&merged, "accept"), Some("text/csv"));
    }

    #[test]
    fn test_empty_layers() {
        assert!(merge_headers(&[]).is_empty());
        assert!(merge_headers(&[&[], &[]]).is_empty());
    }
}
