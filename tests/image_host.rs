use anyhow::Result;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use user_api::config::ImageHostConfig;
use user_api::services::{CloudinaryClient, ImageHost, ImageHostError, UploadOptions};

fn client_for(server: &MockServer) -> Result<CloudinaryClient> {
    CloudinaryClient::new(&ImageHostConfig {
        cloud_name: "shop".to_string(),
        api_key: "key-123".to_string(),
        api_secret: "secret".to_string(),
        base_url: server.uri(),
        avatar_folder: "avatars".to_string(),
        avatar_width: 150,
    })
}

#[tokio::test]
async fn test_upload_posts_signed_form() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shop/image/upload"))
        .and(body_string_contains("folder=avatars"))
        .and(body_string_contains("transformation=w_150"))
        .and(body_string_contains("api_key=key-123"))
        .and(body_string_contains("signature="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "avatars/abc",
            "secure_url": "https://res.example.com/shop/avatars/abc.png",
            "width": 150
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let uploaded = client
        .upload(
            "https://example.com/me.png",
            &UploadOptions {
                folder: "avatars".to_string(),
                width: Some(150),
            },
        )
        .await?;

    assert_eq!(uploaded.public_id, "avatars/abc");
    assert_eq!(
        uploaded.secure_url,
        "https://res.example.com/shop/avatars/abc.png"
    );
    Ok(())
}

#[tokio::test]
async fn test_upload_rejection_carries_host_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shop/image/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Invalid image file" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let err = client
        .upload(
            "data:image/png;base64,bm90IGFuIGltYWdl",
            &UploadOptions {
                folder: "avatars".to_string(),
                width: None,
            },
        )
        .await
        .unwrap_err();

    match err {
        ImageHostError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid image file");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_destroy_tolerates_missing_image() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shop/image/destroy"))
        .and(body_string_contains("public_id=avatars%2Fgone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    client.destroy("avatars/gone").await?;
    Ok(())
}
