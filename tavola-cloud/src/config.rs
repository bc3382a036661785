//! Service configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP listen port
    pub http_port: u16,
    /// Upper bound on pooled PostgreSQL connections
    pub database_max_connections: u32,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for user tokens
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Dashboard base URL (checkout success/cancel, billing portal return)
    pub app_base_url: String,
    /// Allowed CORS origins; empty means permissive in development
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        Self::secret_from(name, std::env::var(name).ok(), environment)
    }

    fn secret_from(
        name: &str,
        value: Option<String>,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match value {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_allowed_origins: parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_placeholder_in_development() {
        let val = Config::secret_from("JWT_SECRET", None, "development").unwrap();
        assert_eq!(val, "dev-JWT_SECRET-not-for-production");
    }

    #[test]
    fn test_secret_required_outside_development() {
        let err = Config::secret_from("JWT_SECRET", None, "production").unwrap_err();
        assert!(err.to_string().contains("must be set"));

        let err = Config::secret_from("JWT_SECRET", Some(String::new()), "staging").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let val = Config::secret_from("JWT_SECRET", Some("s3cr3t".into()), "production").unwrap();
        assert_eq!(val, "s3cr3t");
    }

    #[test]
    fn test_parse_origins() {
        assert!(parse_origins("").is_empty());
        assert_eq!(
            parse_origins("https://a.example/, https://b.example ,,"),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
