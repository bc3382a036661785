//! Stripe integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::models::BillingInterval;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum accepted age of a webhook event, in seconds
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Thin Stripe REST client (form-encoded requests, basic auth with the secret key)
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
        }
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<serde_json::Value, BoxError> {
        let resp: serde_json::Value = self
            .http
            .post(format!("{API_BASE}{path}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?
            .json()
            .await?;
        if let Some(err) = resp.get("error") {
            return Err(format!("Stripe {path} failed: {err}").into());
        }
        Ok(resp)
    }

    /// Create a Stripe Customer for a company
    pub async fn create_customer(
        &self,
        email: &str,
        name: &str,
        company_id: &str,
    ) -> Result<String, BoxError> {
        let resp = self
            .post_form(
                "/customers",
                &[
                    ("email", email),
                    ("name", name),
                    ("metadata[company_id]", company_id),
                ],
            )
            .await?;

        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| format!("Stripe create_customer failed: {resp}").into())
    }

    /// Create a Checkout Session (subscription mode), returning its URL
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        package_id: i64,
        interval: BillingInterval,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String, BoxError> {
        let package_id = package_id.to_string();
        let resp = self
            .post_form(
                "/checkout/sessions",
                &[
                    ("customer", customer_id),
                    ("mode", "subscription"),
                    ("line_items[0][price]", price_id),
                    ("line_items[0][quantity]", "1"),
                    ("success_url", success_url),
                    ("cancel_url", cancel_url),
                    ("allow_promotion_codes", "true"),
                    ("metadata[package_id]", &package_id),
                    ("metadata[interval]", interval_str(interval)),
                ],
            )
            .await?;

        resp["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| format!("Stripe create_checkout failed: {resp}").into())
    }

    /// Create a Billing Portal session, returning its URL
    pub async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BoxError> {
        let resp = self
            .post_form(
                "/billing_portal/sessions",
                &[("customer", customer_id), ("return_url", return_url)],
            )
            .await?;

        resp["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| format!("Stripe billing portal failed: {resp}").into())
    }
}

pub fn interval_str(interval: BillingInterval) -> &'static str {
    match interval {
        BillingInterval::Monthly => "monthly",
        BillingInterval::Yearly => "yearly",
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid Stripe-Signature header")]
    MalformedHeader,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Webhook signature mismatch")]
    Mismatch,
    #[error("Webhook timestamp outside tolerance")]
    Stale,
}

/// Verify Stripe webhook signature (HMAC-SHA256 over `"{t}.{body}"`)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Constant-time comparison via hmac::verify_slice; any v1 entry may match
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if (now_secs - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(SignatureError::Stale);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"invoice.paid"}"#;

    fn sign(ts: i64, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature() {
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(now, BODY));
        assert_eq!(verify_webhook_signature_at(BODY, &header, SECRET, now + 10), Ok(()));
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let now = 1_700_000_000;
        let header = format!("t={now},v1=deadbeef,v1={}", sign(now, BODY));
        assert!(verify_webhook_signature_at(BODY, &header, SECRET, now).is_ok());
    }

    #[test]
    fn test_tampered_body() {
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(now, BODY));
        let tampered = br#"{"id":"evt_1","type":"invoice.payment_failed"}"#;
        assert_eq!(
            verify_webhook_signature_at(tampered, &header, SECRET, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp() {
        let ts = 1_700_000_000;
        let header = format!("t={ts},v1={}", sign(ts, BODY));
        assert_eq!(
            verify_webhook_signature_at(BODY, &header, SECRET, ts + 301),
            Err(SignatureError::Stale)
        );
        assert!(verify_webhook_signature_at(BODY, &header, SECRET, ts + 300).is_ok());
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_webhook_signature_at(BODY, "garbage", SECRET, 0),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_webhook_signature_at(BODY, "t=abc,v1=00", SECRET, 0),
            Err(SignatureError::InvalidTimestamp)
        );
        assert_eq!(
            verify_webhook_signature_at(BODY, "t=1,v1=not-hex", SECRET, 1),
            Err(SignatureError::Mismatch)
        );
    }
}
