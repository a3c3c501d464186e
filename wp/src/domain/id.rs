//! Record ID generation and resolution
//!
//! All IDs use the format: `{8-char-hex}-{type}-{slug}`
//! Example: `7f3a91c2-plan-da-lat`

use std::collections::HashMap;

/// Generate a record ID from type and title
///
/// The hex part comes from the random tail of a v7 UUID, so IDs minted in
/// the same millisecond for the same title still differ.
pub fn generate_id(record_type: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    let hex = &uuid[uuid.len() - 8..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex, record_type)
    } else {
        format!("{}-{}-{}", hex, record_type, slug)
    }
}

/// Slugify a title for use in IDs
pub(crate) fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join("-")
}

/// ID resolution for partial matches
pub struct IdResolver<'a> {
    ids: &'a HashMap<String, String>, // id -> display name
}

impl<'a> IdResolver<'a> {
    pub fn new(ids: &'a HashMap<String, String>) -> Self {
        Self { ids }
    }

    /// Resolve a partial reference to a full ID
    ///
    /// Returns:
    /// - Ok(Some(id)) if exactly one match (an exact match always wins)
    /// - Ok(None) if no matches
    /// - Err with candidates if ambiguous
    pub fn resolve(&self, reference: &str) -> Result<Option<String>, Vec<String>> {
        if self.ids.contains_key(reference) {
            return Ok(Some(reference.to_string()));
        }

        let mut matches: Vec<String> = self
            .ids
            .keys()
            .filter(|id| Self::matches(id, reference))
            .cloned()
            .collect();
        matches.sort();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(matches),
        }
    }

    fn matches(id: &str, reference: &str) -> bool {
        if reference.is_empty() {
            return false;
        }

        // Hex prefix match
        if id.starts_with(reference) {
            return true;
        }

        // Type/slug contains match
        if let Some(slug_start) = id.find('-') {
            return id[slug_start + 1..].contains(reference);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id("plan", "Da Lat, Vietnam");
        assert!(id.contains("-plan-"));
        assert!(id.ends_with("da-lat-vietnam"));
        assert_eq!(id.split('-').next().unwrap().len(), 8);
    }

    #[test]
    fn test_generate_id_without_slug() {
        let id = generate_id("session", "");
        assert!(id.ends_with("-session"));
        assert_ne!(generate_id("session", ""), generate_id("session", ""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Sa Pa!"), "sa-pa");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("here's a test"), "heres-a-test");
        assert_eq!(slugify("Đà Lạt"), "l-t");
    }

    #[test]
    fn test_id_resolver() {
        let mut ids = HashMap::new();
        ids.insert("7f3a91c2-plan-da-lat".to_string(), "Da Lat".to_string());
        ids.insert("0b12ee40-plan-sa-pa".to_string(), "Sa Pa".to_string());
        ids.insert("0b13aa01-plan-sa-pa-winter".to_string(), "Sa Pa".to_string());

        let resolver = IdResolver::new(&ids);
        assert_eq!(resolver.resolve("7f3a").unwrap(), Some("7f3a91c2-plan-da-lat".to_string()));
        assert_eq!(resolver.resolve("winter").unwrap(), Some("0b13aa01-plan-sa-pa-winter".to_string()));
        assert_eq!(resolver.resolve("hanoi").unwrap(), None);
        assert_eq!(resolver.resolve("sa-pa").unwrap_err().len(), 2);
        assert_eq!(
            resolver.resolve("0b12ee40-plan-sa-pa").unwrap(),
            Some("0b12ee40-plan-sa-pa".to_string())
        );
    }
}
