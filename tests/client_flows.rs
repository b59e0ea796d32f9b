//! End-to-end behavior of the client against a mocked backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pristine_client::api::{ApiClient, ApiError, TokenSource};
use pristine_client::config::ApiConfig;
use pristine_client::inquiries::{InquiryForm, InquiryKind, InquiryService};
use pristine_client::models::PropertyCategory;
use pristine_client::properties::{MediaOutcome, PropertyService};
use pristine_client::session::{Credentials, SessionManager};
use pristine_client::wizard::{PendingAttachment, PropertyDraft};

/// Fixed token source so header and purge behavior are observable.
struct StaticTokens {
    token: &'static str,
    invalidated: AtomicBool,
}

impl StaticTokens {
    fn new(token: &'static str) -> Self {
        Self {
            token,
            invalidated: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokens {
    async fn csrf_token(&self) -> String {
        self.token.to_string()
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }
}

fn config_for(server: &MockServer) -> ApiConfig {
    ApiConfig::new(format!("{}/api", server.uri()), server.uri())
}

fn client_for(server: &MockServer, tokens: Arc<StaticTokens>) -> Arc<ApiClient> {
    let client = ApiClient::new(config_for(server))
        .expect("client")
        .with_token_source(tokens);
    Arc::new(client)
}

fn draft_with_media() -> PropertyDraft {
    let mut draft = PropertyDraft {
        title: "Quarter-acre plot".into(),
        description: "Serviced plot in a gated scheme".into(),
        category: Some(PropertyCategory::Land),
        address: "Kangundo Rd".into(),
        city: "Nairobi".into(),
        state: "Nairobi".into(),
        price: Some(2_950_000.0),
        size_acres: Some(0.25),
        ..Default::default()
    };
    let mut front = PendingAttachment::new("front.jpg", "image/jpeg", vec![0xff, 0xd8]);
    front.caption = "Road frontage".into();
    draft.add_attachment(front);
    draft.add_attachment(PendingAttachment::new("beacon.jpg", "image/jpeg", vec![0xff, 0xd9]));
    draft
}

fn property_body(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Quarter-acre plot",
        "property_type": "land",
        "city": "Nairobi",
        "state": "Nairobi",
        "price": 2950000.0,
        "size_acres": 0.25
    })
}

#[tokio::test]
async fn resolver_falls_through_to_the_second_candidate() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/properties/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/properties/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(property_body(7)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(property_body(99)))
        .expect(0)
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens));
    let property = service.create(&draft_with_media()).await.expect("created");
    assert_eq!(property.id, 7);
}

#[tokio::test]
async fn resolver_stops_at_a_validation_rejection() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/properties/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({
                "title": ["This field is required."]
            })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/properties/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(property_body(7)))
        .expect(0)
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens));
    let err = service.create(&draft_with_media()).await.unwrap_err();
    match err {
        ApiError::Validation { fields, .. } => {
            assert_eq!(fields["title"], vec!["This field is required."]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn resolver_exhaustion_reports_every_candidate() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path_regex(r"^/api/(properties/(create/)?|create/)$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens));
    let err = service.create(&draft_with_media()).await.unwrap_err();
    match err {
        ApiError::NotFound(message) => {
            assert!(message.contains("all 3 candidate endpoints failed"), "{message}");
        }
        other => panic!("expected aggregated not-found, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_purges_the_token_and_classifies_authentication() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("GET"))
        .and(path("/api/properties/5/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens.clone()));
    let err = service.get(5).await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
    assert!(tokens.invalidated.load(Ordering::SeqCst));
}

#[tokio::test]
async fn mutating_requests_carry_the_token_header() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/public-inquiry/"))
        .and(header("X-CSRFToken", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 31,
            "message": "Hello",
            "inquiry_type": "general_inquiry"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = InquiryService::new(client_for(&server, tokens));
    let form = InquiryForm {
        name: "Jane".into(),
        email: "jane@example.com".into(),
        phone: "0711".into(),
        message: "Hello".into(),
        ..Default::default()
    };
    let inquiry = service.submit(InquiryKind::GeneralInquiry, &form).await.expect("submitted");
    assert_eq!(inquiry.id, 31);
}

#[tokio::test]
async fn csrf_token_is_issued_once_when_the_cookie_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "csrf_token": "issued-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/public-inquiry/"))
        .and(header("X-CSRFToken", "issued-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "inquiry_type": "general_inquiry"
        })))
        .expect(2)
        .mount(&server)
        .await;

    // Default cookie-backed token source this time.
    let client = Arc::new(ApiClient::new(config_for(&server)).expect("client"));
    let service = InquiryService::new(client);
    let form = InquiryForm {
        message: "First".into(),
        ..Default::default()
    };
    service.submit(InquiryKind::GeneralInquiry, &form).await.expect("first");
    // Second submission reuses the cached token; the issuing endpoint is
    // not hit again.
    service.submit(InquiryKind::GeneralInquiry, &form).await.expect("second");
}

#[tokio::test]
async fn two_phase_upload_failure_keeps_the_created_listing() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/properties/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(property_body(7)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/properties/7/upload_images/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    // No rollback of any kind is ever issued.
    Mock::given(method("DELETE"))
        .and(path_regex(r".*"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens));
    let mut milestones = Vec::new();
    let created = service
        .create_with_media(&draft_with_media(), |p| milestones.push(p))
        .await
        .expect("listing itself must survive the upload failure");

    assert_eq!(created.property.id, 7);
    match created.media {
        MediaOutcome::Failed(err) => assert!(matches!(err, ApiError::Server(_))),
        MediaOutcome::Uploaded(_) => panic!("upload should have failed"),
    }
    assert_eq!(milestones, vec![30, 60]);
}

#[tokio::test]
async fn two_phase_success_reports_all_milestones() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/properties/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(property_body(7)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/properties/7/upload_images/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "image": "plots/front.jpg", "is_primary": true },
            { "id": 12, "image": "plots/beacon.jpg", "is_primary": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens));
    let mut milestones = Vec::new();
    let created = service
        .create_with_media(&draft_with_media(), |p| milestones.push(p))
        .await
        .expect("created");

    match created.media {
        MediaOutcome::Uploaded(assets) => assert_eq!(assets.len(), 2),
        MediaOutcome::Failed(err) => panic!("upload should have succeeded: {err}"),
    }
    assert_eq!(milestones, vec![30, 60, 100]);
}

#[tokio::test]
async fn creation_failure_never_attempts_an_upload() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path_regex(r"^/api/(properties/(create/)?|create/)$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/properties/\d+/upload_images/$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = PropertyService::new(client_for(&server, tokens));
    let mut milestones = Vec::new();
    let result = service
        .create_with_media(&draft_with_media(), |p| milestones.push(p))
        .await;
    assert!(result.is_err());
    assert!(milestones.is_empty());
}

#[tokio::test]
async fn no_content_and_non_json_bodies_are_successes() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("DELETE"))
        .and(path("/api/properties/9/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let client = client_for(&server, tokens);
    let service = PropertyService::new(client.clone());
    service.delete(9).await.expect("204 is success");

    let body = client.get("/categories/").await.expect("non-JSON 200 is success");
    assert_eq!(body, json!({ "message": "Success" }));
}

#[tokio::test]
async fn login_replaces_the_session_and_failed_logout_still_clears_it() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": { "id": 12, "username": "njeri", "user_type": "seller" },
            "message": "Login successful"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server, tokens));
    let credentials = Credentials {
        username: "njeri".into(),
        password: "hunter2".into(),
    };
    let user = session.login(&credentials).await.expect("login");
    assert_eq!(user.username, "njeri");
    assert!(session.is_authenticated());

    // Remote invalidation fails, local state clears anyway.
    assert!(session.logout().await.is_err());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn login_failure_clears_the_session_and_surfaces_the_message() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Invalid credentials"
        })))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server, tokens));
    let credentials = Credentials {
        username: "njeri".into(),
        password: "wrong".into(),
    };
    let err = session.login(&credentials).await.unwrap_err();
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn a_second_concurrent_login_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": { "id": 12, "username": "njeri" } }))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server, tokens));
    let credentials = Credentials {
        username: "njeri".into(),
        password: "hunter2".into(),
    };

    let (first, second) = tokio::join!(
        session.login(&credentials),
        async {
            // Let the first call reach its suspension point.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            session.login(&credentials).await
        }
    );

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(pristine_client::session::SessionError::LoginInFlight)
    ));
}

#[tokio::test]
async fn startup_check_swallows_backend_failures() {
    let server = MockServer::start().await;
    let tokens = Arc::new(StaticTokens::new("tok-123"));

    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server, tokens));
    // Must not panic or error out, just leave the session anonymous.
    session.check_on_load().await;
    assert!(!session.is_authenticated());
}
