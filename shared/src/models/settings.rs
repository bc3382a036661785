//! Theme settings
//!
//! One row per company. `version` increases on every write and is the only
//! input to the storefront ETag, so clients revalidate with a cheap compare.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ThemeSettings {
    pub company_id: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub font_heading: String,
    pub font_body: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub about_text: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: serde_json::Value,
    pub social_links: serde_json::Value,
    pub version: i64,
    pub updated_at: i64,
}

impl ThemeSettings {
    /// Settings for a company that never saved any (version 0)
    pub fn defaults(company_id: &str) -> Self {
        Self {
            company_id: company_id.to_string(),
            primary_color: "#1f2937".to_string(),
            secondary_color: "#f59e0b".to_string(),
            accent_color: "#10b981".to_string(),
            font_heading: "Playfair Display".to_string(),
            font_body: "Inter".to_string(),
            logo_url: None,
            favicon_url: None,
            hero_title: None,
            hero_subtitle: None,
            about_text: None,
            contact_email: None,
            contact_phone: None,
            address: None,
            opening_hours: serde_json::json!({}),
            social_links: serde_json::json!({}),
            version: 0,
            updated_at: 0,
        }
    }

    pub fn etag(&self) -> String {
        theme_etag(&self.company_id, self.version)
    }
}

/// Strong ETag for a settings version: `"<company_id>-v<version>"`
pub fn theme_etag(company_id: &str, version: i64) -> String {
    format!("\"{company_id}-v{version}\"")
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*`, comma separated lists and weak validators (`W/"..."`).
pub fn if_none_match_hits(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ThemeUpdate {
    #[validate(length(min = 4, max = 9))]
    pub primary_color: Option<String>,
    #[validate(length(min = 4, max = 9))]
    pub secondary_color: Option<String>,
    #[validate(length(min = 4, max = 9))]
    pub accent_color: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub font_heading: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub font_body: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    #[validate(url)]
    pub favicon_url: Option<String>,
    #[validate(length(max = 200))]
    pub hero_title: Option<String>,
    #[validate(length(max = 500))]
    pub hero_subtitle: Option<String>,
    #[validate(length(max = 10000))]
    pub about_text: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 40))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub opening_hours: Option<serde_json::Value>,
    pub social_links: Option<serde_json::Value>,
}

impl ThemeUpdate {
    /// Overlay this update on `current`, leaving version/timestamps alone
    pub fn apply_to(self, current: &mut ThemeSettings) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    current.$field = v;
                }
            };
            (opt $field:ident) => {
                if let Some(v) = self.$field {
                    current.$field = Some(v);
                }
            };
        }
        set!(primary_color);
        set!(secondary_color);
        set!(accent_color);
        set!(font_heading);
        set!(font_body);
        set!(opt logo_url);
        set!(opt favicon_url);
        set!(opt hero_title);
        set!(opt hero_subtitle);
        set!(opt about_text);
        set!(opt contact_email);
        set!(opt contact_phone);
        set!(opt address);
        set!(opening_hours);
        set!(social_links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_format() {
        assert_eq!(theme_etag("abc", 3), "\"abc-v3\"");
        assert_eq!(ThemeSettings::defaults("abc").etag(), "\"abc-v0\"");
    }

    #[test]
    fn test_if_none_match() {
        let etag = theme_etag("abc", 3);
        assert!(if_none_match_hits("\"abc-v3\"", &etag));
        assert!(if_none_match_hits("W/\"abc-v3\"", &etag));
        assert!(if_none_match_hits("\"abc-v1\", \"abc-v3\"", &etag));
        assert!(if_none_match_hits("*", &etag));
        assert!(!if_none_match_hits("\"abc-v2\"", &etag));
        assert!(!if_none_match_hits("", &etag));
    }

    #[test]
    fn test_apply_update() {
        let mut settings = ThemeSettings::defaults("abc");
        ThemeUpdate {
            primary_color: Some("#000000".into()),
            hero_title: Some("Welcome".into()),
            ..Default::default()
        }
        .apply_to(&mut settings);
        assert_eq!(settings.primary_color, "#000000");
        assert_eq!(settings.hero_title.as_deref(), Some("Welcome"));
        assert_eq!(settings.font_body, "Inter");
        assert_eq!(settings.version, 0);
    }
}
