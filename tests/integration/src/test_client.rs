//! Client integration tests against the verifying mock endpoint.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use http::StatusCode;
    use serde_json::json;
    use tc3_aiart::{AiArtError, GeneratedImage, TextToImageLiteRequest, TextToImageLiteResponse};
    use tc3_auth::Credentials;

    use crate::{MockEndpoint, TEST_SECRET_ID, valid_credentials};

    fn prompt(text: &str) -> TextToImageLiteRequest {
        TextToImageLiteRequest::builder()
            .prompt(text.to_owned())
            .resolution(Some("1024:1024".to_owned()))
            .build()
    }

    fn api_code(err: &AiArtError) -> &str {
        match err {
            AiArtError::Api { code, .. } => code,
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_generate_base64_image() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());

        let image = client.text_to_image_lite(&prompt("a cat")).await.unwrap();
        assert_eq!(image, GeneratedImage::Base64("iVBORw0KGgo=".to_owned()));

        let calls = endpoint.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].action, "TextToImageLite");
        assert_eq!(calls[0].region, "ap-guangzhou");
        assert_eq!(calls[0].version, "2022-12-29");
        assert_eq!(calls[0].signed_headers, vec!["content-type", "host"]);
    }

    #[tokio::test]
    async fn test_should_generate_url_image() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());
        let request = TextToImageLiteRequest::builder()
            .prompt("a red fox".to_owned())
            .rsp_img_type(Some("url".to_owned()))
            .build();

        let image = client.text_to_image_lite(&request).await.unwrap();
        assert_eq!(
            image,
            GeneratedImage::Url("https://mock.invalid/a-red-fox.png".to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_reject_wrong_secret_key() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(Credentials::new(TEST_SECRET_ID, "not-the-key"));

        let err = client.text_to_image_lite(&prompt("a cat")).await.unwrap_err();
        assert_eq!(api_code(&err), "AuthFailure.SignatureFailure");
        assert!(endpoint.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_unknown_secret_id() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(Credentials::new("AKIDUNKNOWN", "whatever"));

        let err = client.text_to_image_lite(&prompt("a cat")).await.unwrap_err();
        assert_eq!(api_code(&err), "AuthFailure.SecretIdNotFound");
    }

    #[tokio::test]
    async fn test_should_report_invalid_parameter() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());

        let err = client
            .call::<_, TextToImageLiteResponse>("TextToImageLite", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(api_code(&err), "InvalidParameter");
    }

    #[tokio::test]
    async fn test_should_report_unknown_action() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());

        let err = client
            .call::<_, TextToImageLiteResponse>("SketchToImage", &json!({"Prompt": "a cat"}))
            .await
            .unwrap_err();
        assert_eq!(api_code(&err), "InvalidAction");
    }

    #[tokio::test]
    async fn test_should_sign_unicode_prompt() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());

        let image = client.text_to_image_lite(&prompt("一只猫")).await;
        assert!(image.is_ok());
    }

    #[tokio::test]
    async fn test_should_use_fresh_nonce_per_call() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());

        for _ in 0..5 {
            client.text_to_image_lite(&prompt("a cat")).await.unwrap();
        }

        let calls = endpoint.calls();
        assert_eq!(calls.len(), 5);
        let nonces: HashSet<_> = calls.iter().map(|c| c.nonce.clone()).collect();
        assert!(nonces.len() > 1);
        assert!(calls.iter().all(|c| c.timestamp > 1_700_000_000));
    }

    #[tokio::test]
    async fn test_should_surface_http_status() {
        let endpoint = MockEndpoint::start().await;
        endpoint.fail_with(StatusCode::SERVICE_UNAVAILABLE, "busy");
        let client = endpoint.client(valid_credentials());

        let err = client.text_to_image_lite(&prompt("a cat")).await.unwrap_err();
        match &err {
            AiArtError::Status { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "busy");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_should_not_send_blank_prompt() {
        let endpoint = MockEndpoint::start().await;
        let client = endpoint.client(valid_credentials());

        let err = client.text_to_image_lite(&prompt(" \t ")).await.unwrap_err();
        assert!(matches!(err, AiArtError::InvalidRequest(_)));
        assert!(endpoint.calls().is_empty());
    }
}
