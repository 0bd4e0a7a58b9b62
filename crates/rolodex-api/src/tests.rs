//! End-to-end tests driving the router with `oneshot` against an in-memory
//! store, a recording mailer, and a fake media host.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use rolodex_auth::MemoryCache;
use rolodex_core::{
  contact::NewContact,
  outbound::{
    MailMessage, MailTemplate, Mailer, MediaHost, OutboundError, UploadedMedia,
    fill_crop_url,
  },
  store::{ContactStore, UserDirectory},
  user::Role,
};
use rolodex_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  AppState, ServerConfig,
  accounts::{
    ALREADY_CONFIRMED, CHECK_EMAIL, EMAIL_CONFIRMED, EMAIL_NOT_CONFIRMED,
    EMAIL_TAKEN, INCORRECT_LOGIN, USERNAME_TAKEN, VERIFICATION_ERROR,
  },
  handlers::health::HEALTHY,
  router,
};

const PASSWORD: &str = "12345678";
const MEDIA_BASE: &str = "https://media.test";

// ─── Fakes ───────────────────────────────────────────────────────────────────

struct RecordingMailer(mpsc::UnboundedSender<MailMessage>);

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, message: MailMessage) -> Result<(), OutboundError> {
    self
      .0
      .send(message)
      .map_err(|e| OutboundError::new("recording", e.to_string()))
  }
}

struct FakeMedia;

#[async_trait]
impl MediaHost for FakeMedia {
  async fn upload(
    &self,
    _bytes: Vec<u8>,
    public_id: &str,
  ) -> Result<UploadedMedia, OutboundError> {
    Ok(UploadedMedia { url: format!("{MEDIA_BASE}/v7/{public_id}"), version: 7 })
  }

  fn avatar_url(&self, public_id: &str, version: u64) -> String {
    fill_crop_url(MEDIA_BASE, public_id, version)
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
  state: AppState<SqliteStore>,
  mail:  mpsc::UnboundedReceiver<MailMessage>,
}

impl Harness {
  async fn new() -> Self {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let (tx, rx) = mpsc::unbounded_channel();
    let config = ServerConfig {
      host:                      "127.0.0.1".to_string(),
      port:                      8000,
      base_url:                  "http://testserver".to_string(),
      store_path:                PathBuf::from(":memory:"),
      jwt_secret:                "test-secret".to_string(),
      jwt_expiration_seconds:    3600,
      session_cache_ttl_seconds: 3600,
      media_dir:                 std::env::temp_dir(),
      media_base_url:            MEDIA_BASE.to_string(),
      me_requests_per_minute:    10,
    };
    let state = AppState::new(
      store,
      config,
      Arc::new(MemoryCache::new()),
      Arc::new(RecordingMailer(tx)),
      Arc::new(FakeMedia),
    );
    Self { state, mail: rx }
  }

  async fn send(&self, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let resp      = router(self.state.clone()).oneshot(req).await.unwrap();
    let status    = resp.status();
    let challenge = resp
      .headers()
      .get(header::WWW_AUTHENTICATE)
      .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body  = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, challenge)
  }

  async fn next_mail(&mut self) -> MailMessage {
    tokio::time::timeout(Duration::from_secs(5), self.mail.recv())
      .await
      .expect("mail dispatched")
      .expect("mailer alive")
  }

  async fn assert_no_mail(&mut self) {
    tokio::task::yield_now().await;
    assert!(self.mail.try_recv().is_err(), "unexpected mail");
  }

  async fn register(&self, username: &str, email: &str) -> (StatusCode, Value) {
    let (status, body, _) = self
      .send(json_req(
        "POST",
        "/api/auth/register",
        json!({ "username": username, "email": email, "password": PASSWORD }),
        None,
      ))
      .await;
    (status, body)
  }

  async fn login(&self, username: &str, password: &str) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
      .method("POST")
      .uri("/api/auth/login")
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from(format!("username={username}&password={password}")))
      .unwrap();
    self.send(req).await
  }

  /// Register, confirm, and log in. Returns the bearer token.
  async fn signup(&mut self, username: &str) -> String {
    let (status, _) = self.register(username, &format!("{username}@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let mail  = self.next_mail().await;
    let token = mail.variables["token"].clone();
    let (status, _, _) = self
      .send(get(&format!("/api/auth/confirmed_email/{token}"), None))
      .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = self.login(username, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
  }

  async fn user_id(&self, username: &str) -> Uuid {
    self
      .state
      .store
      .get_user_by_username(username)
      .await
      .unwrap()
      .unwrap()
      .user_id
  }
}

fn json_req(method: &str, uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
  let mut builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json");
  if let Some(token) = bearer {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
  let mut builder = Request::builder().method("GET").uri(uri);
  if let Some(token) = bearer {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, bearer: &str) -> Request<Body> {
  Request::builder()
    .method("DELETE")
    .uri(uri)
    .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    .body(Body::empty())
    .unwrap()
}

fn avatar_upload(bearer: &str) -> Request<Body> {
  let boundary = "rolodex-test-boundary";
  let body = format!(
    "--{boundary}\r\n\
     Content-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\n\
     Content-Type: image/png\r\n\r\n\
     not-really-a-png\r\n\
     --{boundary}--\r\n"
  );
  Request::builder()
    .method("PATCH")
    .uri("/api/users/avatar")
    .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={boundary}"),
    )
    .body(Body::from(body))
    .unwrap()
}

fn contact_body(first: &str, email: &str, phone: &str) -> Value {
  json!({
    "first_name": first,
    "email": email,
    "phone_number": phone,
    "birthday": "1990-06-15",
  })
}

// ── Registration & login ─────────────────────────────────────────────────────

#[tokio::test]
async fn deadpool_registers_confirms_and_logs_in() {
  let mut h = Harness::new().await;

  let (status, body) = h.register("deadpool", "deadpool@example.com").await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["username"], "deadpool");
  assert_eq!(body["confirmed"], false);
  assert_eq!(body["role"], "user");
  assert!(body.get("password_hash").is_none());
  assert!(body["avatar"].as_str().unwrap().starts_with("https://www.gravatar.com/avatar/"));

  let (status, body, _) = h.login("deadpool", PASSWORD).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], EMAIL_NOT_CONFIRMED);

  let mail = h.next_mail().await;
  assert_eq!(mail.template, MailTemplate::VerifyEmail);
  assert_eq!(mail.recipient, "deadpool@example.com");
  assert_eq!(mail.variables["host"], "http://testserver");
  assert_eq!(mail.variables["username"], "deadpool");

  let confirm = format!("/api/auth/confirmed_email/{}", mail.variables["token"]);
  let (status, body, _) = h.send(get(&confirm, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], EMAIL_CONFIRMED);
  let stored = h.state.store.get_user_by_username("deadpool").await.unwrap().unwrap();
  assert!(stored.confirmed);

  let (status, body, _) = h.send(get(&confirm, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], ALREADY_CONFIRMED);

  let (status, body, _) = h.login("deadpool", PASSWORD).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["token_type"], "bearer");
  let token = body["access_token"].as_str().unwrap().to_string();

  let (status, body, challenge) = h.login("deadpool", "wrong-password").await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], INCORRECT_LOGIN);
  assert_eq!(challenge.as_deref(), Some("Bearer"));

  let (status, body, _) = h.send(get("/api/users/me", Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "deadpool");
  assert_eq!(body["confirmed"], true);
}

#[tokio::test]
async fn unknown_user_login_matches_wrong_password() {
  let h = Harness::new().await;
  let (status, body, _) = h.login("nobody", PASSWORD).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], INCORRECT_LOGIN);
}

#[tokio::test]
async fn registration_conflicts_report_email_first() {
  let h = Harness::new().await;
  h.register("deadpool", "deadpool@example.com").await;

  let (status, body) = h.register("wade", "deadpool@example.com").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["detail"], EMAIL_TAKEN);

  let (status, body) = h.register("deadpool", "wade@example.com").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["detail"], USERNAME_TAKEN);

  let (status, body) = h.register("deadpool", "deadpool@example.com").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["detail"], EMAIL_TAKEN);
}

#[tokio::test]
async fn invalid_registration_is_unprocessable() {
  let h = Harness::new().await;
  let (status, _) = h.register(&"x".repeat(21), "long@example.com").await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  let (status, _) = h.register("bob", "not-an-email").await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Bearer resolution ────────────────────────────────────────────────────────

#[tokio::test]
async fn protected_routes_require_a_valid_bearer() {
  let h = Harness::new().await;

  let (status, body, challenge) = h.send(get("/api/contacts", None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], "Not authenticated");
  assert_eq!(challenge.as_deref(), Some("Bearer"));

  let (status, body, _) = h.send(get("/api/users/me", Some("garbage"))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], "Could not validate credentials");

  let ghost = h.state.auth.tokens().issue_session_token("ghost").unwrap();
  let (status, body, _) = h.send(get("/api/users/me", Some(&ghost))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], "Could not validate credentials");
}

#[tokio::test]
async fn cached_role_is_served_until_evicted() {
  let mut h = Harness::new().await;
  let token = h.signup("deadpool").await;

  // Populates the session cache with role = user.
  let (status, _, _) = h.send(get("/api/users/me", Some(&token))).await;
  assert_eq!(status, StatusCode::OK);

  h.state.store.set_role("deadpool@example.com", Role::Admin).await.unwrap();

  let (status, body, _) = h.send(avatar_upload(&token)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["detail"], "Allowed only for Admin");

  h.state.auth.sessions().evict("deadpool").await.unwrap();
  let (status, _, _) = h.send(avatar_upload(&token)).await;
  assert_eq!(status, StatusCode::OK);
}

// ── Health and limits ────────────────────────────────────────────────────────

#[tokio::test]
async fn healthchecker_pings_the_store() {
  let h = Harness::new().await;
  let (status, body, _) = h.send(get("/api/healthchecker", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], HEALTHY);
}

#[tokio::test]
async fn me_is_limited_to_ten_requests_a_minute() {
  let mut h = Harness::new().await;
  let token = h.signup("deadpool").await;

  for _ in 0..10 {
    let (status, _, _) = h.send(get("/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
  }

  let resp = router(h.state.clone())
    .oneshot(get("/api/users/me", Some(&token)))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
  assert!(resp.headers().contains_key(header::RETRY_AFTER));

  // Other routes draw on no quota.
  let (status, _, _) = h.send(get("/api/contacts", Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn uploaded_media_is_served() {
  let h   = Harness::new().await;
  let dir = format!("rolodex-serve-{}", Uuid::new_v4());
  let root = std::env::temp_dir().join(&dir);
  tokio::fs::create_dir_all(&root).await.unwrap();
  tokio::fs::write(root.join("avatar.png"), b"png-bytes").await.unwrap();

  let resp = router(h.state.clone())
    .oneshot(get(&format!("/media/{dir}/avatar.png?v=7"), None))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert_eq!(&bytes[..], b"png-bytes");

  tokio::fs::remove_dir_all(&root).await.unwrap();
}

// ── Email confirmation ───────────────────────────────────────────────────────

#[tokio::test]
async fn bad_confirmation_tokens_are_bad_requests() {
  let h = Harness::new().await;

  let (status, body, _) = h.send(get("/api/auth/confirmed_email/garbage", None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "Invalid email verification token");

  let token = h.state.auth.tokens().issue_action_token("ghost@example.com").unwrap();
  let (status, body, _) = h
    .send(get(&format!("/api/auth/confirmed_email/{token}"), None))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], VERIFICATION_ERROR);
}

#[tokio::test]
async fn resend_confirmation() {
  let mut h = Harness::new().await;
  h.register("deadpool", "deadpool@example.com").await;
  h.next_mail().await;

  let resend = |email: &str| {
    json_req("POST", "/api/auth/request_email", json!({ "email": email }), None)
  };

  let (status, body, _) = h.send(resend("deadpool@example.com")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], CHECK_EMAIL);
  assert_eq!(h.next_mail().await.template, MailTemplate::VerifyEmail);

  let (_, body, _) = h.send(resend("ghost@example.com")).await;
  assert_eq!(body["message"], CHECK_EMAIL);
  h.assert_no_mail().await;

  h.state.store.confirm_email("deadpool@example.com").await.unwrap();
  let (_, body, _) = h.send(resend("deadpool@example.com")).await;
  assert_eq!(body["message"], ALREADY_CONFIRMED);
  h.assert_no_mail().await;
}

// ── Password reset ───────────────────────────────────────────────────────────

#[tokio::test]
async fn password_reset_flow() {
  let mut h = Harness::new().await;
  h.signup("deadpool").await;

  let (status, body, _) = h
    .send(json_req(
      "POST",
      "/api/auth/request_password_reset",
      json!({ "email": "deadpool@example.com" }),
      None,
    ))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], CHECK_EMAIL);

  let mail = h.next_mail().await;
  assert_eq!(mail.template, MailTemplate::ResetPassword);
  let uri = format!("/api/auth/password_reset/{}", mail.variables["token"]);

  let (status, _, _) = h
    .send(json_req("POST", &uri, json!({ "new_password": "short" }), None))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, body, _) = h
    .send(json_req("POST", &uri, json!({ "new_password": "brand-new-pw" }), None))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "deadpool");

  let (status, _, _) = h.login("deadpool", PASSWORD).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _, _) = h.login("deadpool", "brand-new-pw").await;
  assert_eq!(status, StatusCode::OK);

  let (status, body, _) = h
    .send(json_req(
      "POST",
      "/api/auth/password_reset/garbage",
      json!({ "new_password": "another-pw" }),
      None,
    ))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "Invalid email verification token");
}

#[tokio::test]
async fn session_token_cannot_stand_in_for_an_action_token() {
  let mut h = Harness::new().await;
  h.signup("deadpool").await;

  // Same subject an emailed link would carry, but minted as a bearer token.
  let session = h
    .state
    .auth
    .tokens()
    .issue_session_token("deadpool@example.com")
    .unwrap();

  let (status, body, _) = h
    .send(json_req(
      "POST",
      &format!("/api/auth/password_reset/{session}"),
      json!({ "new_password": "hijacked1" }),
      None,
    ))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "Invalid email verification token");

  let (status, _, _) = h
    .send(get(&format!("/api/auth/confirmed_email/{session}"), None))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _, _) = h.login("deadpool", "hijacked1").await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _, _) = h.login("deadpool", PASSWORD).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn action_token_is_not_a_bearer_token() {
  let mut h = Harness::new().await;
  let bearer = h.signup("deadpool").await;
  let action = h
    .state
    .auth
    .tokens()
    .issue_action_token("deadpool")
    .unwrap();

  let (status, _, _) = h.send(get("/api/users/me", Some(&action))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _, _) = h.send(get("/api/users/me", Some(&bearer))).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_for_unknown_email_sends_nothing() {
  let mut h = Harness::new().await;
  let (status, body, _) = h
    .send(json_req(
      "POST",
      "/api/auth/request_password_reset",
      json!({ "email": "ghost@example.com" }),
      None,
    ))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], CHECK_EMAIL);
  h.assert_no_mail().await;
}

// ── Avatar ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn avatar_update_is_admin_only() {
  let mut h = Harness::new().await;
  let token = h.signup("deadpool").await;

  let (status, body, _) = h.send(avatar_upload(&token)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["detail"], "Allowed only for Admin");
}

#[tokio::test]
async fn admin_avatar_upload_stores_derived_url() {
  let mut h = Harness::new().await;
  let token = h.signup("deadpool").await;
  h.state.store.set_role("deadpool@example.com", Role::Admin).await.unwrap();

  let (status, body, _) = h.send(avatar_upload(&token)).await;
  assert_eq!(status, StatusCode::OK);
  let expected = "https://media.test/c_fill,h_250,w_250/v7/Rolodex/deadpool";
  assert_eq!(body["avatar"], expected);

  // The session cache was refreshed with the new avatar.
  let (_, body, _) = h.send(get("/api/users/me", Some(&token))).await;
  assert_eq!(body["avatar"], expected);
}

// ── Contacts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contact_crud() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;

  let (status, created, _) = h
    .send(json_req(
      "POST",
      "/api/contacts",
      contact_body("Bob", "bob@example.com", "5550001"),
      Some(&token),
    ))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["first_name"], "Bob");
  assert_eq!(created["birthday"], "1990-06-15");
  let id  = created["contact_id"].as_str().unwrap().to_string();
  let uri = format!("/api/contacts/{id}");

  let (status, fetched, _) = h.send(get(&uri, Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let (status, updated, _) = h
    .send(json_req("PUT", &uri, json!({ "last_name": "Builder" }), Some(&token)))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["last_name"], "Builder");
  assert_eq!(updated["email"], "bob@example.com");

  let (status, unchanged, _) = h.send(json_req("PUT", &uri, json!({}), Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(unchanged, updated);

  let (status, list, _) = h.send(get("/api/contacts", Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);

  let (status, removed, _) = h.send(delete(&uri, &token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(removed["contact_id"], id.as_str());

  let (status, body, _) = h.send(get(&uri, Some(&token))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["detail"], "Contact not found");
}

#[tokio::test]
async fn explicit_null_clears_optional_contact_fields() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;

  let mut body = contact_body("Bob", "bob@example.com", "5550001");
  body["last_name"]       = json!("Lee");
  body["additional_data"] = json!("met at the fair");
  let (_, created, _) = h
    .send(json_req("POST", "/api/contacts", body, Some(&token)))
    .await;
  let uri = format!("/api/contacts/{}", created["contact_id"].as_str().unwrap());

  let (status, kept, _) = h
    .send(json_req("PUT", &uri, json!({ "first_name": "Robert" }), Some(&token)))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(kept["last_name"], "Lee");
  assert_eq!(kept["additional_data"], "met at the fair");

  let (status, cleared, _) = h
    .send(json_req("PUT", &uri, json!({ "last_name": null }), Some(&token)))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(cleared["last_name"], Value::Null);
  assert_eq!(cleared["first_name"], "Robert");
  assert_eq!(cleared["additional_data"], "met at the fair");
}

#[tokio::test]
async fn search_matches_non_ascii_names() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;
  h.send(json_req(
    "POST",
    "/api/contacts",
    contact_body("Ärger", "arger@example.com", "5550001"),
    Some(&token),
  ))
  .await;

  let (status, hits, _) = h
    .send(get("/api/contacts/search?query=%C3%A4rg", Some(&token)))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(hits.as_array().unwrap().len(), 1);
  assert_eq!(hits[0]["first_name"], "Ärger");
}

#[tokio::test]
async fn duplicate_contacts_conflict_per_field() {
  let mut h = Harness::new().await;
  let alice = h.signup("alice").await;
  let carol = h.signup("carol").await;

  let create = |body: Value, token: &str| json_req("POST", "/api/contacts", body, Some(token));

  let (status, _, _) = h.send(create(contact_body("Bob", "bob@example.com", "5550001"), &alice)).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body, _) = h.send(create(contact_body("Rob", "bob@example.com", "5550002"), &alice)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["detail"], "Contact with this email already exists.");

  let (status, body, _) = h.send(create(contact_body("Rob", "rob@example.com", "5550001"), &alice)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["detail"], "Contact with this phone number already exists.");

  let (status, _, _) = h.send(create(contact_body("Bob", "bob@example.com", "5550001"), &carol)).await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn contacts_are_invisible_to_other_users() {
  let mut h = Harness::new().await;
  let alice   = h.signup("alice").await;
  let mallory = h.signup("mallory").await;

  let (_, created, _) = h
    .send(json_req(
      "POST",
      "/api/contacts",
      contact_body("Bob", "bob@example.com", "5550001"),
      Some(&alice),
    ))
    .await;
  let uri = format!("/api/contacts/{}", created["contact_id"].as_str().unwrap());

  let (status, _, _) = h.send(get(&uri, Some(&mallory))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _, _) = h
    .send(json_req("PUT", &uri, json!({ "first_name": "Pwned" }), Some(&mallory)))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _, _) = h.send(delete(&uri, &mallory)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, list, _) = h.send(get("/api/contacts", Some(&mallory))).await;
  assert!(list.as_array().unwrap().is_empty());

  let (status, still_there, _) = h.send(get(&uri, Some(&alice))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(still_there["first_name"], "Bob");
}

#[tokio::test]
async fn invalid_contact_is_unprocessable() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;
  let (status, _, _) = h
    .send(json_req(
      "POST",
      "/api/contacts",
      contact_body("Bob", "bob@example.com", &"5".repeat(16)),
      Some(&token),
    ))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn search_requires_three_characters() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;
  h.send(json_req(
    "POST",
    "/api/contacts",
    contact_body("Wade", "merc@example.com", "5550001"),
    Some(&token),
  ))
  .await;

  let (status, _, _) = h.send(get("/api/contacts/search?query=wa", Some(&token))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, hits, _) = h.send(get("/api/contacts/search?query=MERC", Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(hits.as_array().unwrap().len(), 1);
  assert_eq!(hits[0]["first_name"], "Wade");
}

#[tokio::test]
async fn list_limit_is_capped() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;
  let owner = h.user_id("alice").await;

  for i in 0..105 {
    h.state
      .store
      .create_contact(owner, NewContact {
        first_name:      format!("c{i:03}"),
        last_name:       None,
        email:           format!("c{i}@example.com"),
        phone_number:    format!("555{i:04}"),
        birthday:        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        additional_data: None,
      })
      .await
      .unwrap();
  }

  let (_, page, _) = h.send(get("/api/contacts?limit=500", Some(&token))).await;
  assert_eq!(page.as_array().unwrap().len(), 100);

  let (_, page, _) = h.send(get("/api/contacts?skip=100&limit=10", Some(&token))).await;
  let page = page.as_array().unwrap();
  assert_eq!(page.len(), 5);
  assert_eq!(page[0]["first_name"], "c100");
}

#[tokio::test]
async fn birthdays_cover_the_coming_week() {
  let mut h = Harness::new().await;
  let token = h.signup("alice").await;

  // Year 2000 is a leap year, so every month-day exists.
  let today = Utc::now().date_naive();
  let later = today.checked_add_days(Days::new(30)).unwrap();
  let in_year_2000 = |d: NaiveDate| {
    NaiveDate::from_ymd_opt(2000, d.month(), d.day()).unwrap().to_string()
  };

  for (name, phone, birthday) in [
    ("Soon", "5550001", in_year_2000(today)),
    ("Later", "5550002", in_year_2000(later)),
  ] {
    let mut body = contact_body(name, &format!("{phone}@example.com"), phone);
    body["birthday"] = json!(birthday);
    let (status, _, _) = h.send(json_req("POST", "/api/contacts", body, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, hits, _) = h.send(get("/api/contacts/birthdays", Some(&token))).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = hits
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["first_name"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["Soon"]);
}
