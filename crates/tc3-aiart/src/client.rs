//! Signed HTTP client for the text-to-image API.

use chrono::Utc;
use http::header::{CONTENT_TYPE, HOST, HeaderValue};
use http::{Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tc3_auth::headers::random_nonce;
use tc3_auth::{ActionHeaders, Credentials, Tc3Signer};
use tc3_core::ClientConfig;
use tracing::{debug, info, warn};

use crate::error::AiArtError;
use crate::model::{
    GeneratedImage, TEXT_TO_IMAGE_LITE, TextToImageLiteRequest, TextToImageLiteResponse,
    parse_response,
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Client that signs every call with TC3-HMAC-SHA256 and posts it as JSON.
///
/// Each call gets a fresh timestamp and nonce. Failed calls are not retried;
/// see [`AiArtError::is_retryable`].
#[derive(Debug, Clone)]
pub struct AiArtClient {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Credentials,
}

impl AiArtClient {
    /// Create a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::Config`] if the configuration is invalid, or
    /// [`AiArtError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, AiArtError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Create a client on top of an existing [`reqwest::Client`].
    ///
    /// The configured timeout is applied per request.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::Config`] if the configuration is invalid.
    pub fn with_http_client(
        config: ClientConfig,
        credentials: Credentials,
        http: reqwest::Client,
    ) -> Result<Self, AiArtError> {
        config.validate()?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a signed `POST /` request for `action`.
    ///
    /// The body is the JSON serialization of `payload`. The signed headers are
    /// `content-type` and `host`; `host` is the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::Serialization`] if the payload cannot be
    /// serialized, [`AiArtError::RequestBuild`] if the request cannot be
    /// assembled, or [`AiArtError::Signing`] if signing fails.
    pub fn build_request<P: Serialize + ?Sized>(
        &self,
        action: &str,
        payload: &P,
        timestamp: i64,
        nonce: u32,
    ) -> Result<Request<Vec<u8>>, AiArtError> {
        let body = serde_json::to_vec(payload)?;
        let host = HeaderValue::from_str(&self.config.endpoint)
            .map_err(|e| AiArtError::RequestBuild(format!("invalid endpoint: {e}")))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.config.endpoint_url())
            .header(HOST, host)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(())
            .map_err(|e| AiArtError::RequestBuild(e.to_string()))?;
        let (mut parts, ()) = request.into_parts();

        ActionHeaders::new(action, self.config.region.as_str(), &self.config.version)
            .with_nonce(nonce)
            .apply(&mut parts.headers)?;

        let signer = Tc3Signer::new(&self.credentials, &self.config.service);
        let signed = signer.sign_request(&mut parts, &body, timestamp)?;

        debug!(
            action,
            timestamp,
            nonce,
            credential_scope = %signed.credential_scope,
            "Built signed request"
        );

        Ok(Request::from_parts(parts, body))
    }

    /// Sign and send one action call, decoding the response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::Status`] for a non-2xx reply,
    /// [`AiArtError::Api`] if the service reports an error, and any error from
    /// [`AiArtClient::build_request`] or the transport.
    pub async fn call<P, T>(&self, action: &str, payload: &P) -> Result<T, AiArtError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let timestamp = Utc::now().timestamp();
        let request = self.build_request(action, payload, timestamp, random_nonce())?;
        let mut request = reqwest::Request::try_from(request)?;
        *request.timeout_mut() = Some(self.config.timeout());

        debug!(action, url = %request.url(), "Sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!(action, status = status.as_u16(), "Request failed");
            return Err(AiArtError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&bytes).inspect_err(|err| {
            if let AiArtError::Api {
                code, request_id, ..
            } = err
            {
                warn!(action, code, request_id = ?request_id, "API returned an error");
            }
        })
    }

    /// Generate an image from a text prompt.
    ///
    /// # Errors
    ///
    /// Returns [`AiArtError::InvalidRequest`] for a blank prompt, without
    /// signing or sending anything; [`AiArtError::MissingImage`] if the reply
    /// carries no image; plus any error from [`AiArtClient::call`].
    pub async fn text_to_image_lite(
        &self,
        request: &TextToImageLiteRequest,
    ) -> Result<GeneratedImage, AiArtError> {
        request.validate()?;
        let response: TextToImageLiteResponse = self.call(TEXT_TO_IMAGE_LITE, request).await?;
        let request_id = response.request_id.clone();
        let image = response.into_image()?;

        info!(
            request_id = ?request_id,
            kind = match image {
                GeneratedImage::Url(_) => "url",
                GeneratedImage::Base64(_) => "base64",
            },
            "Image generated"
        );

        Ok(image)
    }
}
