//! Request and response shapes of the text-to-image action.
//!
//! Field names on the wire are PascalCase. Every response is wrapped in a
//! `{"Response": {...}}` envelope that carries either the action output or an
//! `Error` object, plus a `RequestId`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::AiArtError;

/// Action name of the lightweight text-to-image call.
pub const TEXT_TO_IMAGE_LITE: &str = "TextToImageLite";

/// Body of a `TextToImageLite` call.
///
/// # Examples
///
/// ```
/// use tc3_aiart::TextToImageLiteRequest;
///
/// let request = TextToImageLiteRequest::builder()
///     .prompt("a cat".to_owned())
///     .resolution(Some("1024:1024".to_owned()))
///     .build();
/// assert_eq!(
///     serde_json::to_string(&request).unwrap(),
///     r#"{"Prompt":"a cat","Resolution":"1024:1024"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "PascalCase")]
pub struct TextToImageLiteRequest {
    /// Text prompt.
    pub prompt: String,

    /// What the image should not contain.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Output size as `width:height`, e.g. `1024:1024`.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// `1` to add the service watermark, `0` to omit it.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_add: Option<u8>,

    /// `base64` (default) or `url`.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsp_img_type: Option<String>,
}

impl TextToImageLiteRequest {
    /// Reject requests the service would refuse anyway.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::InvalidRequest`] if the prompt is empty or only
    /// whitespace.
    pub fn validate(&self) -> Result<(), AiArtError> {
        if self.prompt.trim().is_empty() {
            return Err(AiArtError::InvalidRequest("Prompt is required".to_owned()));
        }
        Ok(())
    }
}

/// Output of a `TextToImageLite` call.
///
/// The service has returned the image under `Images`, `Image` or
/// `ResultImage`; all three are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextToImageLiteResponse {
    /// Images as a list; only the first non-empty entry is used.
    #[serde(default)]
    pub images: Vec<String>,

    /// A single image.
    #[serde(default)]
    pub image: Option<String>,

    /// Base64 image data or a temporary URL, depending on `RspImgType`.
    #[serde(default)]
    pub result_image: Option<String>,

    /// Request id assigned by the service.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl TextToImageLiteResponse {
    /// Extract the generated image, checking `Images`, then `Image`, then
    /// `ResultImage`.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::MissingImage`] if no non-empty image is present.
    pub fn into_image(self) -> Result<GeneratedImage, AiArtError> {
        self.images
            .into_iter()
            .chain(self.image)
            .chain(self.result_image)
            .find(|image| !image.is_empty())
            .map(GeneratedImage::from_result)
            .ok_or(AiArtError::MissingImage)
    }
}

/// A generated image as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Temporary download URL.
    Url(String),
    /// Base64-encoded image bytes.
    Base64(String),
}

impl GeneratedImage {
    fn from_result(value: String) -> Self {
        if value.starts_with("https://") || value.starts_with("http://") {
            Self::Url(value)
        } else {
            Self::Base64(value)
        }
    }

    /// The raw URL or base64 payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Base64(s) => s,
        }
    }
}

/// The `Error` object inside a failed response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseError {
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(default)]
    request_id: Option<String>,
}

/// Unwrap the `Response` envelope and decode the action output.
///
/// # Errors
///
/// Returns [`AiArtError::Api`] if the envelope carries an `Error`, or
/// [`AiArtError::Serialization`] if the body is not the expected JSON.
pub fn parse_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, AiArtError> {
    #[derive(Deserialize)]
    struct Envelope {
        #[serde(rename = "Response")]
        response: serde_json::Value,
    }

    let envelope: Envelope = serde_json::from_slice(body)?;
    let outcome = ResponseError::deserialize(&envelope.response)?;

    if let Some(error) = outcome.error {
        return Err(AiArtError::Api {
            code: error.code,
            message: error.message,
            request_id: outcome.request_id,
        });
    }

    Ok(serde_json::from_value(envelope.response)?)
}
