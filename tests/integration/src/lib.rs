//! End-to-end tests for the TC3 client.
//!
//! Each test starts an in-process mock of the text-to-image endpoint that
//! verifies the TC3-HMAC-SHA256 signature of every request with
//! [`tc3_auth::verify_tc3`] before answering with the service's JSON envelope.
//!
//! Run them with:
//! ```text
//! cargo test -p tc3-integration
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tc3_aiart::AiArtClient;
use tc3_auth::headers::{X_TC_ACTION, X_TC_NONCE, X_TC_REGION, X_TC_VERSION};
use tc3_auth::{AuthError, Credentials, StaticCredentialProvider, verify_tc3};
use tc3_core::ClientConfig;
use tokio::net::TcpListener;
use tracing::{debug, warn};

static INIT: Once = Once::new();

/// Secret id the mock endpoint accepts.
pub const TEST_SECRET_ID: &str = "AKIDINTEGRATION";

/// Secret key belonging to [`TEST_SECRET_ID`].
pub const TEST_SECRET_KEY: &str = "integration-secret";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A request the mock endpoint accepted.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Value of `X-TC-Action`.
    pub action: String,
    /// Value of `X-TC-Region`.
    pub region: String,
    /// Value of `X-TC-Version`.
    pub version: String,
    /// Value of `X-TC-Nonce`.
    pub nonce: String,
    /// Signed timestamp.
    pub timestamp: i64,
    /// Signed header names.
    pub signed_headers: Vec<String>,
}

/// An in-process mock of the signed endpoint.
#[derive(Debug, Clone)]
pub struct MockEndpoint {
    addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    outage: Arc<Mutex<Option<(StatusCode, &'static str)>>>,
}

impl MockEndpoint {
    /// Bind to an ephemeral local port and start serving.
    pub async fn start() -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind mock endpoint: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("failed to read mock endpoint address: {e}"));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = Arc::new(StaticCredentialProvider::new([(
            TEST_SECRET_ID.to_owned(),
            TEST_SECRET_KEY.to_owned(),
        )]));

        let outage = Arc::new(Mutex::new(None));

        let state = Arc::clone(&calls);
        let failure = Arc::clone(&outage);
        tokio::spawn(async move {
            loop {
                let Ok((stream, peer_addr)) = listener.accept().await else {
                    continue;
                };
                let provider = Arc::clone(&provider);
                let calls = Arc::clone(&state);
                let outage = Arc::clone(&failure);
                let svc = service_fn(move |req| {
                    handle(
                        req,
                        Arc::clone(&provider),
                        Arc::clone(&calls),
                        Arc::clone(&outage),
                    )
                });

                tokio::spawn(async move {
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        warn!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }
        });

        Self {
            addr,
            calls,
            outage,
        }
    }

    /// Answer every following request with `status` and a plain-text `body`,
    /// before any signature check.
    pub fn fail_with(&self, status: StatusCode, body: &'static str) {
        *self.outage.lock() = Some((status, body));
    }

    /// `host:port` of the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Calls accepted so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// A client pointed at this endpoint, signing with `credentials`.
    #[must_use]
    pub fn client(&self, credentials: Credentials) -> AiArtClient {
        let config = ClientConfig::builder()
            .endpoint(self.endpoint())
            .scheme("http".to_owned())
            .timeout_secs(10)
            .build();
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|e| panic!("failed to build HTTP client: {e}"));
        AiArtClient::with_http_client(config, credentials, http)
            .unwrap_or_else(|e| panic!("failed to build client: {e}"))
    }
}

/// Credentials the mock endpoint accepts.
#[must_use]
pub fn valid_credentials() -> Credentials {
    Credentials::new(TEST_SECRET_ID, TEST_SECRET_KEY)
}

async fn handle(
    req: Request<Incoming>,
    provider: Arc<StaticCredentialProvider>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    outage: Arc<Mutex<Option<(StatusCode, &'static str)>>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let outage = *outage.lock();
    if let Some((status, text)) = outage {
        let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
        *response.status_mut() = status;
        return Ok(response);
    }

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &error_envelope("InvalidParameter", &e.to_string()),
            ));
        }
    };

    let verified = match verify_tc3(&parts, &body, provider.as_ref()) {
        Ok(verified) => verified,
        Err(err) => {
            debug!(error = %err, "Rejected request");
            return Ok(json_response(
                StatusCode::OK,
                &error_envelope(auth_error_code(&err), &err.to_string()),
            ));
        }
    };

    let header = |name: &http::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    };
    let call = RecordedCall {
        action: header(&X_TC_ACTION),
        region: header(&X_TC_REGION),
        version: header(&X_TC_VERSION),
        nonce: header(&X_TC_NONCE),
        timestamp: verified.timestamp,
        signed_headers: verified.signed_headers,
    };
    let envelope = respond_to_action(&call.action, &body);
    calls.lock().push(call);

    Ok(json_response(StatusCode::OK, &envelope))
}

fn respond_to_action(action: &str, body: &[u8]) -> Value {
    if action != "TextToImageLite" {
        return error_envelope("InvalidAction", &format!("unknown action: {action}"));
    }

    let Ok(payload) = serde_json::from_slice::<Value>(body) else {
        return error_envelope("InvalidParameter", "body is not JSON");
    };
    let prompt = payload["Prompt"].as_str().unwrap_or_default();
    if prompt.is_empty() {
        return error_envelope("InvalidParameter", "Prompt is required");
    }

    let image = if payload["RspImgType"] == "url" {
        format!("https://mock.invalid/{}.png", prompt.replace(' ', "-"))
    } else {
        "iVBORw0KGgo=".to_owned()
    };

    json!({
        "Response": {
            "ResultImage": image,
            "RequestId": uuid::Uuid::new_v4().to_string(),
        }
    })
}

fn auth_error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::SecretIdNotFound(_) => "AuthFailure.SecretIdNotFound",
        AuthError::SignatureDoesNotMatch => "AuthFailure.SignatureFailure",
        _ => "AuthFailure.InvalidAuthorization",
    }
}

fn error_envelope(code: &str, message: &str) -> Value {
    json!({
        "Response": {
            "Error": { "Code": code, "Message": message },
            "RequestId": uuid::Uuid::new_v4().to_string(),
        }
    })
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

mod test_client;
