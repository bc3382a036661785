//! Database access layer
//!
//! Every tenant-owned query filters on `company_id`; soft-deleted rows
//! (`deleted_at IS NOT NULL`) are invisible to all reads.

pub mod audit;
pub mod blog;
pub mod carousel;
pub mod companies;
pub mod contacts;
pub mod dashboard;
pub mod faq;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod packages;
pub mod reservations;
pub mod settings;
pub mod subscriptions;
pub mod tables;
pub mod testimonials;
pub mod tickets;
pub mod users;
pub mod webhook_events;

/// Whitelisted `sort` query value → ORDER BY clause.
///
/// A leading `-` selects descending order; unknown keys fall back to the
/// first entry of `allowed`.
pub(crate) fn order_by(sort: Option<&str>, allowed: &[(&str, &str)]) -> String {
    let (key, desc) = match sort.map(str::trim) {
        Some(s) if s.starts_with('-') => (&s[1..], true),
        Some(s) => (s, false),
        None => ("", false),
    };
    let column = allowed
        .iter()
        .find(|(k, _)| *k == key)
        .or_else(|| allowed.first())
        .map(|(_, col)| *col)
        .unwrap_or("id");
    format!("{column} {}", if desc { "DESC" } else { "ASC" })
}

/// `%term%` pattern for ILIKE with LIKE metacharacters escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[(&str, &str)] = &[("name", "name"), ("price", "price")];

    #[test]
    fn test_order_by_whitelist() {
        assert_eq!(order_by(Some("price"), KEYS), "price ASC");
        assert_eq!(order_by(Some("-price"), KEYS), "price DESC");
        assert_eq!(order_by(None, KEYS), "name ASC");
        // unknown and injection attempts fall back to the default column
        assert_eq!(order_by(Some("price; DROP TABLE users"), KEYS), "name ASC");
        assert_eq!(order_by(Some("-bogus"), KEYS), "name DESC");
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("pasta"), "%pasta%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
