//! Client for the text-to-image cloud API.
//!
//! Requests are JSON `POST`s to the service root, routed by the `X-TC-Action`
//! header and authenticated with TC3-HMAC-SHA256 via [`tc3_auth`].
//!
//! ```no_run
//! use tc3_aiart::{AiArtClient, TextToImageLiteRequest};
//! use tc3_auth::Credentials;
//! use tc3_core::ClientConfig;
//!
//! # async fn run() -> Result<(), tc3_aiart::AiArtError> {
//! let client = AiArtClient::new(ClientConfig::from_env(), Credentials::from_env()?)?;
//! let request = TextToImageLiteRequest::builder()
//!     .prompt("a cat".to_owned())
//!     .build();
//! let image = client.text_to_image_lite(&request).await?;
//! println!("{}", image.as_str());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod model;

pub use client::AiArtClient;
pub use error::AiArtError;
pub use model::{GeneratedImage, TextToImageLiteRequest, TextToImageLiteResponse};
