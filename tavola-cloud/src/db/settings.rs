//! Theme settings storage (one row per company, versioned)

use shared::models::ThemeSettings;
use sqlx::PgPool;

const COLUMNS: &str = "company_id, primary_color, secondary_color, accent_color, font_heading, font_body,
    logo_url, favicon_url, hero_title, hero_subtitle, about_text, contact_email, contact_phone,
    address, opening_hours, social_links, version, updated_at";

pub async fn find(pool: &PgPool, company_id: &str) -> Result<Option<ThemeSettings>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM company_settings WHERE company_id = $1"
    ))
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

/// Write the full settings row and bump `version` in the same statement.
///
/// The first save inserts version 1 (defaults are version 0).
pub async fn save(
    pool: &PgPool,
    s: &ThemeSettings,
    now: i64,
) -> Result<ThemeSettings, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO company_settings ({COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 1, $17)
         ON CONFLICT (company_id) DO UPDATE SET
            primary_color = EXCLUDED.primary_color,
            secondary_color = EXCLUDED.secondary_color,
            accent_color = EXCLUDED.accent_color,
            font_heading = EXCLUDED.font_heading,
            font_body = EXCLUDED.font_body,
            logo_url = EXCLUDED.logo_url,
            favicon_url = EXCLUDED.favicon_url,
            hero_title = EXCLUDED.hero_title,
            hero_subtitle = EXCLUDED.hero_subtitle,
            about_text = EXCLUDED.about_text,
            contact_email = EXCLUDED.contact_email,
            contact_phone = EXCLUDED.contact_phone,
            address = EXCLUDED.address,
            opening_hours = EXCLUDED.opening_hours,
            social_links = EXCLUDED.social_links,
            version = company_settings.version + 1,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(&s.company_id)
    .bind(&s.primary_color)
    .bind(&s.secondary_color)
    .bind(&s.accent_color)
    .bind(&s.font_heading)
    .bind(&s.font_body)
    .bind(&s.logo_url)
    .bind(&s.favicon_url)
    .bind(&s.hero_title)
    .bind(&s.hero_subtitle)
    .bind(&s.about_text)
    .bind(&s.contact_email)
    .bind(&s.contact_phone)
    .bind(&s.address)
    .bind(&s.opening_hours)
    .bind(&s.social_links)
    .bind(now)
    .fetch_one(pool)
    .await
}
