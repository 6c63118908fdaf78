use storefront_common::EnvVars;

pub struct ApiServerEnv {
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub site_url: String,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .expect("STRIPE_SECRET_KEY is not set"),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
                .expect("STRIPE_WEBHOOK_SECRET is not set"),
            site_url: std::env::var("SITE_URL")
                .expect("SITE_URL is not set")
                .trim_end_matches('/')
                .to_string(),
        }
    }
}
