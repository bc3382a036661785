//! Small helpers shared by the service and its tests

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Primary keys stay unique through the database constraint; this only needs
/// to be roughly time-ordered and non-sequential.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF;
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000);
    (ts << 12) | rand_bits
}

/// Turn a display name into a URL slug: lowercase ASCII alphanumerics
/// separated by single dashes. Non-ASCII letters are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Normalize an email for lookups and uniqueness checks
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_fits_js_number() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1_i64 << 53));
    }

    #[test]
    fn test_snowflake_roughly_ordered() {
        let a = snowflake_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = snowflake_id();
        assert!(b >> 12 > a >> 12);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("La Trattoria"), "la-trattoria");
        assert_eq!(slugify("  Joe's  Diner & Bar!! "), "joe-s-diner-bar");
        assert_eq!(slugify("Café 21"), "caf-21");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Owner@Example.COM "), "owner@example.com");
    }
}
