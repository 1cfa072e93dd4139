use thiserror::Error;

/// Why a capture cycle could not produce a verdict. The text becomes the
/// `details` of the `error` report.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("API key not set (set ACC_OPENROUTER_API_KEY)")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(u16),

    #[error("unexpected API response: {0}")]
    MalformedResponse(String),

    #[error("capture worker failed: {0}")]
    Worker(String),
}
