use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::constants::GATEWAY_TIMEOUT_SECS;

use super::{ChargeOutcome, GatewayError, PaymentGateway};

const SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";
const LIVE_URL: &str = "https://api-m.paypal.com";

/// PayPal Orders API client: creates an order with intent CAPTURE and
/// captures it immediately.
pub struct PayPalGateway {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl PayPalGateway {
    pub fn new(client_id: String, client_secret: String, live: bool) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(GATEWAY_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        let base_url = if live { LIVE_URL } else { SANDBOX_URL };

        PayPalGateway {
            client,
            base_url: base_url.to_string(),
            client_id,
            client_secret,
        }
    }

    /// Builds a gateway from `PAYPAL_CLIENT_ID`, `PAYPAL_CLIENT_SECRET` and
    /// `PAYPAL_ENVIRONMENT` ("live" selects the production endpoint).
    pub fn from_env() -> std::result::Result<Self, GatewayError> {
        let client_id = std::env::var("PAYPAL_CLIENT_ID")
            .map_err(|_| GatewayError::NotConfigured("PAYPAL_CLIENT_ID is not set".to_string()))?;
        let client_secret = std::env::var("PAYPAL_CLIENT_SECRET").map_err(|_| {
            GatewayError::NotConfigured("PAYPAL_CLIENT_SECRET is not set".to_string())
        })?;
        let live = std::env::var("PAYPAL_ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("live"))
            .unwrap_or(false);

        Ok(Self::new(client_id, client_secret, live))
    }

    async fn access_token(&self) -> std::result::Result<String, GatewayError> {
        let url = format!("{}/v1/oauth2/token", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::NotConfigured(format!(
                "token request rejected with status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Http(format!("failed to parse token response: {}", e)))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn charge(
        &self,
        amount: Decimal,
        description: &str,
        payer_email: &str,
    ) -> std::result::Result<ChargeOutcome, GatewayError> {
        let token = self.access_token().await?;

        // Create the order
        let create_url = format!("{}/v2/checkout/orders", self.base_url);
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": "USD",
                    "value": amount.round_dp(2).to_string(),
                },
                "description": description,
            }],
            "payment_source": {
                "paypal": { "email_address": payer_email }
            }
        });

        let response = self
            .client
            .post(&create_url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() != StatusCode::CREATED && !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Declined(format!(
                "order creation failed with status {}: {}",
                status, text
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Http(format!("failed to parse order response: {}", e)))?;

        debug!("Created payment order {}", order.id);

        // Capture it
        let capture_url = format!("{}/v2/checkout/orders/{}/capture", self.base_url, order.id);
        let response = self
            .client
            .post(&capture_url)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Declined(format!(
                "capture failed with status {}: {}",
                status, text
            )));
        }

        let capture: OrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Http(format!("failed to parse capture response: {}", e)))?;

        let external_ref = capture
            .capture_id()
            .unwrap_or_else(|| capture.id.clone());

        Ok(ChargeOutcome { external_ref })
    }
}

fn map_request_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Http(e.to_string())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

impl OrderResponse {
    fn capture_id(&self) -> Option<String> {
        self.purchase_units
            .first()?
            .payments
            .as_ref()?
            .captures
            .first()
            .map(|c| c.id.clone())
    }
}

#[derive(Deserialize)]
struct PurchaseUnit {
    payments: Option<Payments>,
}

#[derive(Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Deserialize)]
struct Capture {
    id: String,
}
