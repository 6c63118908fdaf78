#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("bad signature: {0}")]
    BadSignature(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),
}
