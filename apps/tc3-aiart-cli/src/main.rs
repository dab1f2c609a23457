//! Command-line client for the text-to-image API.
//!
//! Sends one signed `TextToImageLite` call and prints the resulting image URL
//! or base64 payload to stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! TENCENTCLOUD_SECRET_ID=... TENCENTCLOUD_SECRET_KEY=... \
//!     tc3-aiart-cli "a cat" --resolution 1024:1024
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TENCENTCLOUD_SECRET_ID` | *(required)* | Secret id |
//! | `TENCENTCLOUD_SECRET_KEY` | *(required)* | Secret key |
//! | `TC3_ENDPOINT` | `aiart.tencentcloudapi.com` | API host |
//! | `TC3_SCHEME` | `https` | URL scheme |
//! | `TC3_SERVICE` | `aiart` | Service name in the credential scope |
//! | `TC3_REGION` | `ap-guangzhou` | Region |
//! | `TC3_VERSION` | `2022-12-29` | API version |
//! | `TC3_TIMEOUT_SECS` | `300` | Request timeout |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result};
use clap::Parser;
use tc3_aiart::{AiArtClient, GeneratedImage, TextToImageLiteRequest};
use tc3_auth::Credentials;
use tc3_core::ClientConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate an image from a text prompt.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Text prompt.
    prompt: String,

    /// Output size as `width:height`.
    #[arg(long, default_value = "1024:1024")]
    resolution: String,

    /// What the image should not contain.
    #[arg(long)]
    negative: Option<String>,

    /// Return a temporary URL instead of base64 data.
    #[arg(long)]
    url: bool,

    /// Add the service watermark.
    #[arg(long)]
    logo: bool,
}

impl Args {
    fn to_request(&self) -> TextToImageLiteRequest {
        TextToImageLiteRequest::builder()
            .prompt(self.prompt.clone())
            .negative_prompt(self.negative.clone())
            .resolution(Some(self.resolution.clone()))
            .logo_add(Some(u8::from(self.logo)))
            .rsp_img_type(self.url.then(|| "url".to_owned()))
            .build()
    }
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ClientConfig::from_env();

    init_tracing(&config.log_level)?;

    let credentials = Credentials::from_env().context("failed to load credentials")?;

    info!(
        endpoint = %config.endpoint,
        region = %config.region,
        version = %config.version,
        "Requesting image"
    );

    let client = AiArtClient::new(config, credentials).context("failed to create client")?;
    let image = client
        .text_to_image_lite(&args.to_request())
        .await
        .context("image generation failed")?;

    match image {
        GeneratedImage::Url(url) => println!("{url}"),
        GeneratedImage::Base64(data) => println!("{data}"),
    }

    Ok(())
}
