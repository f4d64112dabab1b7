//! Tests for the generation handler.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::{App, test, web};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{AccountQuery, FixtureAccountQuery, MockGenerationCommand};
use crate::domain::{ErrorCode, ImageReference};
use crate::inbound::http::test_utils::{fixture_state, state_with};

const BOUNDARY: &str = "headshot-boundary";
const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    bytes: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n",
                part.name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn image_part(bytes: &[u8]) -> Part<'_> {
    Part {
        name: IMAGE_FIELD,
        file_name: Some("me.jpg"),
        bytes,
    }
}

fn generate_request(parts: &[Part<'_>], token: Option<&str>) -> test::TestRequest {
    let mut req = test::TestRequest::post()
        .uri("/api/v1/generate/create")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(parts));
    if let Some(token) = token {
        req = req.insert_header((AUTHORIZATION, format!("Bearer {token}")));
    }
    req
}

async fn call(state: HttpState, req: test::TestRequest) -> (StatusCode, Value) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(web::scope("/api/v1").service(create_generation)),
    )
    .await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body_json(res).await;
    (status, body)
}

fn accounts() -> Arc<dyn AccountQuery> {
    Arc::new(FixtureAccountQuery)
}

#[rstest]
#[actix_web::test]
async fn successful_generation_returns_image_and_balance() {
    let staged_path: Arc<Mutex<Option<PathBuf>>> = Arc::default();
    let seen_path = Arc::clone(&staged_path);
    let mut command = MockGenerationCommand::new();
    command
        .expect_generate()
        .withf(|request| {
            request.user_id.as_ref() == USER
                && request.upload.as_ref().is_some_and(|upload| {
                    upload.file_name() == Some("me.jpg") && upload.size_bytes() == 4
                })
        })
        .times(1)
        .return_once(move |request| {
            let upload = request.upload.expect("upload present");
            let path = upload.path().expect("staged path").to_path_buf();
            assert!(path.exists(), "upload is on disk while the use case runs");
            *seen_path.lock().expect("lock") = Some(path);
            Ok(GenerateResponse {
                image_reference: ImageReference::new("http://x/y.png").expect("reference"),
                credits_remaining: Credits::new(5),
            })
        });

    let (status, body) = call(
        state_with(Arc::new(command), accounts()),
        generate_request(&[image_part(b"jpeg")], Some(USER)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Headshot generated successfully",
            "imageReference": "http://x/y.png",
            "creditsRemaining": 5,
        })
    );
    let path = staged_path.lock().expect("lock").clone().expect("path seen");
    assert!(!path.exists(), "staged upload removed after the request");
}

#[rstest]
#[actix_web::test]
async fn other_fields_are_ignored() {
    let mut command = MockGenerationCommand::new();
    command
        .expect_generate()
        .withf(|request| request.upload.is_none())
        .times(1)
        .return_once(|_| Err(Error::invalid_request("No image file uploaded")));
    let note = Part {
        name: "note",
        file_name: None,
        bytes: b"hello",
    };

    let (status, body) = call(
        state_with(Arc::new(command), accounts()),
        generate_request(&[note], Some(USER)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("No image file uploaded"));
}

#[rstest]
#[actix_web::test]
async fn missing_token_is_unauthorized_and_skips_generation() {
    let mut command = MockGenerationCommand::new();
    command.expect_generate().never();

    let (status, body) = call(
        state_with(Arc::new(command), accounts()),
        generate_request(&[image_part(b"jpeg")], None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("unauthorized"));
}

#[rstest]
#[actix_web::test]
async fn insufficient_credits_is_forbidden() {
    let mut command = MockGenerationCommand::new();
    command.expect_generate().return_once(|_| {
        Err(
            Error::insufficient_credits("Insufficient credits (Minimum 25 required)")
                .with_details(json!({"balance": 10, "cost": 25})),
        )
    });

    let (status, body) = call(
        state_with(Arc::new(command), accounts()),
        generate_request(&[image_part(b"jpeg")], Some(USER)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("insufficient_credits"));
    assert_eq!(body["details"]["balance"], json!(10));
}

#[rstest]
#[actix_web::test]
async fn malformed_multipart_is_a_bad_request() {
    let req = test::TestRequest::post()
        .uri("/api/v1/generate/create")
        .insert_header((CONTENT_TYPE, "multipart/form-data"))
        .insert_header((AUTHORIZATION, format!("Bearer {USER}")))
        .set_payload("not multipart");

    let (status, body) = call(fixture_state(), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!(ErrorCode::InvalidRequest.as_str()));
}

#[rstest]
#[actix_web::test]
async fn fixture_command_reports_balance() {
    let (status, body) = call(
        fixture_state(),
        generate_request(&[image_part(b"jpeg")], Some(USER)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["creditsRemaining"], json!(75));
}

#[rstest]
#[actix_web::test]
async fn caller_without_account_gets_a_generation_failure() {
    use crate::domain::GenerationService;
    use crate::domain::ports::MockGenerationBackend;
    use crate::outbound::memory::{InMemoryAccountStore, InMemoryHistoryRepository};
    use mockable::DefaultClock;

    let mut backend = MockGenerationBackend::new();
    backend.expect_forward().never();
    let service = GenerationService::new(
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryHistoryRepository::new()),
        Arc::new(backend),
        Arc::new(DefaultClock),
        Default::default(),
    );

    let (status, body) = call(
        state_with(Arc::new(service), accounts()),
        generate_request(&[image_part(b"jpeg")], Some(USER)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], json!(ErrorCode::InternalError.as_str()));
    assert_eq!(body["message"], json!("Generation failed"));
    assert!(body.get("details").is_none());
}
