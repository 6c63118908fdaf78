use async_trait::async_trait;
use reqwest::Client;

use crate::error::GatewayError;
use crate::gateway::{
    CreateSessionParams, HostedSession, PaymentGateway, SessionDetails, METADATA_ORDER_ID,
};

/// Client for Stripe Checkout over the plain REST surface: hosted
/// sessions are created with a form-encoded POST and read back with a
/// GET. Only the fields this service needs are modelled.
pub struct StripeGateway {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    const BASE_URL: &'static str = "https://api.stripe.com";

    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.into(),
            api_base: Self::BASE_URL.to_string(),
        }
    }

    /// Points the client at a different host. Test servers only.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn session_form(params: &CreateSessionParams) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), params.success_url.clone()),
            ("cancel_url".to_string(), params.cancel_url.clone()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            (
                format!("metadata[{METADATA_ORDER_ID}]"),
                params.order_id.to_string(),
            ),
        ];

        if let Some(email) = &params.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }

        for (i, item) in params.line_items.iter().enumerate() {
            form.push((
                format!("line_items[{i}][price_data][currency]"),
                params.currency.clone(),
            ));
            form.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            form.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        form
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<HostedSession, GatewayError> {
        let form = Self::session_form(&params);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Provider(format!(
                "session create failed with status {}: {}",
                status, text
            )));
        }

        let session: HostedSession = response.json().await?;
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError> {
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Provider(format!(
                "session retrieve failed with status {}: {}",
                status, text
            )));
        }

        let session: SessionDetails = response.json().await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CheckoutLineItem;

    fn params() -> CreateSessionParams {
        CreateSessionParams {
            line_items: vec![
                CheckoutLineItem {
                    name: "Keyboard".to_string(),
                    unit_amount: 1999,
                    quantity: 3,
                },
                CheckoutLineItem {
                    name: "Mouse".to_string(),
                    unit_amount: 4000,
                    quantity: 1,
                },
            ],
            currency: "usd".to_string(),
            customer_email: Some("ada@example.com".to_string()),
            success_url: "https://store.test/orders/success".to_string(),
            cancel_url: "https://store.test/orders/canceled".to_string(),
            order_id: 42,
        }
    }

    fn lookup<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn form_carries_session_basics() {
        let form = StripeGateway::session_form(&params());

        assert_eq!(lookup(&form, "mode"), Some("payment"));
        assert_eq!(lookup(&form, "payment_method_types[0]"), Some("card"));
        assert_eq!(lookup(&form, "metadata[order_id]"), Some("42"));
        assert_eq!(lookup(&form, "customer_email"), Some("ada@example.com"));
        assert_eq!(
            lookup(&form, "success_url"),
            Some("https://store.test/orders/success")
        );
        assert_eq!(
            lookup(&form, "cancel_url"),
            Some("https://store.test/orders/canceled")
        );
    }

    #[test]
    fn form_encodes_each_line_item() {
        let form = StripeGateway::session_form(&params());

        assert_eq!(
            lookup(&form, "line_items[0][price_data][currency]"),
            Some("usd")
        );
        assert_eq!(
            lookup(&form, "line_items[0][price_data][unit_amount]"),
            Some("1999")
        );
        assert_eq!(
            lookup(&form, "line_items[0][price_data][product_data][name]"),
            Some("Keyboard")
        );
        assert_eq!(lookup(&form, "line_items[0][quantity]"), Some("3"));
        assert_eq!(
            lookup(&form, "line_items[1][price_data][unit_amount]"),
            Some("4000")
        );
        assert_eq!(lookup(&form, "line_items[1][quantity]"), Some("1"));
    }

    #[test]
    fn form_omits_email_when_absent() {
        let mut p = params();
        p.customer_email = None;
        let form = StripeGateway::session_form(&p);
        assert_eq!(lookup(&form, "customer_email"), None);
    }
}
