//! Router-level tests: every request goes through the full axum stack against
//! an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use chrono::Duration;
use depot_core::{
  catalog::{Category, MAX_CENTS, Product, ProductDetail, Tag},
  event::Event,
  order::Order,
  ticket::Ticket,
  user::{Role, User},
};
use depot_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tokio::sync::broadcast::error::TryRecvError;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, Hub, account::AuthResponse, auth::AuthConfig, router};

type State = AppState<SqliteStore>;

async fn make_state_with(auth: AuthConfig) -> State {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store), Hub::new(16), auth)
}

async fn make_state() -> State { make_state_with(AuthConfig::default()).await }

async fn oneshot_raw(
  state: &State,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Send a request and decode the JSON response body (`Null` when empty).
async fn call(
  state: &State,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let resp = oneshot_raw(state, method, uri, token, body).await;
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> T {
  serde_json::from_value(value).unwrap()
}

async fn register(state: &State, name: &str) -> AuthResponse {
  let (status, body) = call(
    state,
    "POST",
    "/api/auth/register",
    None,
    Some(json!({
      "username": name,
      "email": format!("{name}@example.com"),
      "password": format!("pw-{name}"),
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  decode(body)
}

async fn create_ticket(state: &State, token: &str, title: &str) -> Ticket {
  let (status, body) = call(
    state,
    "POST",
    "/api/tickets",
    Some(token),
    Some(json!({ "title": title, "description": "it is broken" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  decode(body)
}

async fn create_product(state: &State, token: &str, title: &str, price: u64, cats: &[&str]) -> Product {
  let (status, body) = call(
    state,
    "POST",
    "/api/products",
    Some(token),
    Some(json!({
      "title": title,
      "barcode": format!("BC-{title}"),
      "price_cents": price,
      "categories": cats,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  decode(body)
}

// ─── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
  let state = make_state().await;
  let (status, body) = call(&state, "GET", "/health", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "ok" }));
}

// ─── Accounts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_registered_user_is_admin() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  assert_eq!(ada.role, Role::Admin);
  assert_eq!(bob.role, Role::Customer);
  assert_ne!(ada.token, bob.token);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let state = make_state().await;
  register(&state, "ada").await;
  let (status, body) = call(
    &state,
    "POST",
    "/api/auth/register",
    None,
    Some(json!({ "username": "ada2", "email": "ADA@example.com", "password": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "email already exists");
}

#[tokio::test]
async fn empty_password_is_rejected() {
  let state = make_state().await;
  let (status, _) = call(
    &state,
    "POST",
    "/api/auth/register",
    None,
    Some(json!({ "username": "ada", "email": "ada@example.com", "password": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_issues_a_working_token() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({ "email": "ada@example.com", "password": "pw-ada" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let login: AuthResponse = decode(body);
  assert_eq!(login.user_id, ada.user_id);
  assert_ne!(login.token, ada.token);

  create_ticket(&state, &login.token, "via login").await;
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
  let state = make_state().await;
  register(&state, "ada").await;

  for (email, password) in [("ada@example.com", "wrong"), ("nobody@example.com", "pw-ada")] {
    let (status, body) = call(
      &state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid email or password");
  }
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let (status, _) = call(&state, "POST", "/api/auth/logout", Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = call(
    &state,
    "POST",
    "/api/tickets",
    Some(&ada.token),
    Some(json!({ "title": "t", "description": "d" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
  let state = make_state_with(AuthConfig { session_ttl: Duration::zero() }).await;
  let ada = register(&state, "ada").await;

  let (status, _) = call(&state, "GET", "/api/orders", Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutations_without_a_token_are_unauthorized() {
  let state = make_state().await;
  let cases = [
    ("POST", "/api/tickets", json!({ "title": "t", "description": "d" })),
    ("POST", "/api/products", json!({ "title": "p", "barcode": "b", "price_cents": 1 })),
    ("POST", "/api/orders", json!({ "items": [] })),
    ("POST", "/api/categories", json!({ "name": "c" })),
  ];
  for (method, uri, body) in cases {
    let resp = oneshot_raw(&state, method, uri, None, Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
  }

  let resp = oneshot_raw(&state, "POST", "/api/tickets", Some("garbage"), Some(json!({}))).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn demoting_the_last_admin_fails() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let uri = format!("/api/auth/demote/{}", ada.user_id);
  let (status, body) = call(&state, "POST", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "cannot demote the last admin");

  let (status, body) = call(
    &state,
    "POST",
    &format!("/api/auth/promote/{}", bob.user_id),
    Some(&ada.token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(decode::<User>(body).role, Role::Admin);

  let (status, body) = call(&state, "POST", &uri, Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(decode::<User>(body).role, Role::Customer);
}

#[tokio::test]
async fn customers_cannot_change_roles() {
  let state = make_state().await;
  register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let uri = format!("/api/auth/promote/{}", bob.user_id);
  let (status, _) = call(&state, "POST", &uri, Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn users_see_themselves_but_not_others() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let own = format!("/api/users/{}", bob.user_id);
  let (status, body) = call(&state, "GET", &own, Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "bob");
  assert!(body.get("password_hash").is_none());

  let other = format!("/api/users/{}", ada.user_id);
  let (status, _) = call(&state, "GET", &other, Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(&state, "GET", "/api/users", Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(&state, "GET", "/api/users", Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_user_keeps_usernames_unique() {
  let state = make_state().await;
  register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let uri = format!("/api/users/{}", bob.user_id);
  let (status, _) =
    call(&state, "PUT", &uri, Some(&bob.token), Some(json!({ "username": "ada" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    call(&state, "PUT", &uri, Some(&bob.token), Some(json!({ "first_name": "Bob" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["first_name"], "Bob");
  assert!(!body["updated_at"].is_null());
}

#[tokio::test]
async fn admin_created_users_are_customers_and_can_log_in() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/users",
    Some(&ada.token),
    Some(json!({ "username": "cy", "email": "cy@example.com", "password": "pw-cy" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(decode::<User>(body).role, Role::Customer);

  let (status, _) = call(
    &state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({ "email": "cy@example.com", "password": "pw-cy" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_ends_their_sessions() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let uri = format!("/api/users/{}", bob.user_id);
  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = call(&state, "GET", "/api/orders", Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Tickets ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_ticket_returns_new_record() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let first = create_ticket(&state, &ada.token, "printer").await;
  let second = create_ticket(&state, &ada.token, "scanner").await;
  assert_ne!(first.ticket_id, second.ticket_id);
  assert_eq!(first.status.as_str(), "Open");
  assert_eq!(first.user_id, ada.user_id);
  assert!(first.updated_at.is_none());

  let uri = format!("/api/tickets/{}", first.ticket_id);
  let (status, body) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(decode::<Ticket>(body), first);
}

#[tokio::test]
async fn subscriber_receives_exactly_one_ticket_created() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let mut rx = state.hub.subscribe();

  let ticket = create_ticket(&state, &ada.token, "printer").await;

  assert_eq!(rx.try_recv().unwrap(), Event::TicketCreated(ticket));
  assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn event_wire_format_is_tagged() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let mut rx = state.hub.subscribe();

  let ticket = create_ticket(&state, &ada.token, "printer").await;
  let wire = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
  assert_eq!(wire["event"], "TicketCreated");
  assert_eq!(wire["payload"]["ticket_id"], ticket.ticket_id.to_string());
}

#[tokio::test]
async fn missing_ticket_fields_are_rejected() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/tickets",
    Some(&ada.token),
    Some(json!({ "title": "  ", "description": "d" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "title is required");

  // A body that does not deserialise keeps axum's own rejection.
  let resp = oneshot_raw(
    &state,
    "POST",
    "/api/tickets",
    Some(&ada.token),
    Some(json!({ "description": "d" })),
  )
  .await;
  assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn non_owner_cannot_update_ticket() {
  let state = make_state().await;
  register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let cy = register(&state, "cy").await;

  let ticket = create_ticket(&state, &bob.token, "printer").await;
  let uri = format!("/api/tickets/{}", ticket.ticket_id);

  let (status, _) =
    call(&state, "PUT", &uri, Some(&cy.token), Some(json!({ "status": "Closed" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, body) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(decode::<Ticket>(body), ticket);

  let (status, _) = call(&state, "DELETE", &uri, Some(&cy.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_and_admin_update_ticket() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let mut rx = state.hub.subscribe();

  let ticket = create_ticket(&state, &bob.token, "printer").await;
  let uri = format!("/api/tickets/{}", ticket.ticket_id);

  let (status, body) =
    call(&state, "PUT", &uri, Some(&bob.token), Some(json!({ "status": "InProgress" }))).await;
  assert_eq!(status, StatusCode::OK);
  let updated: Ticket = decode(body);
  assert_eq!(updated.status.as_str(), "InProgress");
  assert!(updated.updated_at.is_some());

  let (status, _) = call(
    &state,
    "PUT",
    &uri,
    Some(&bob.token),
    Some(json!({ "admin_comment": "fixed it myself" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(
    &state,
    "PUT",
    &uri,
    Some(&ada.token),
    Some(json!({ "status": "Closed", "admin_comment": "replaced toner" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let closed: Ticket = decode(body);
  assert_eq!(closed.admin_comment.as_deref(), Some("replaced toner"));

  let names: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.name()).collect();
  assert_eq!(names, ["TicketCreated", "TicketUpdated", "TicketUpdated"]);
}

#[tokio::test]
async fn delete_ticket_broadcasts_removed_record() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let ticket = create_ticket(&state, &ada.token, "printer").await;
  let mut rx = state.hub.subscribe();

  let uri = format!("/api/tickets/{}", ticket.ticket_id);
  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(rx.try_recv().unwrap(), Event::TicketDeleted(ticket));

  let (status, _) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_unknown_ids_is_not_found() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let id = Uuid::new_v4();

  for resource in ["tickets", "products", "categories", "orders", "users"] {
    let uri = format!("/api/{resource}/{id}");
    let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{resource}");
  }
}

#[tokio::test]
async fn list_tickets_filters() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let t1 = create_ticket(&state, &ada.token, "one").await;
  create_ticket(&state, &bob.token, "two").await;
  create_ticket(&state, &bob.token, "three").await;
  let uri = format!("/api/tickets/{}", t1.ticket_id);
  call(&state, "PUT", &uri, Some(&ada.token), Some(json!({ "status": "Closed" }))).await;

  let (_, all) = call(&state, "GET", "/api/tickets", None, None).await;
  assert_eq!(all.as_array().unwrap().len(), 3);

  let (_, open) = call(&state, "GET", "/api/tickets?status=Open", None, None).await;
  assert_eq!(open.as_array().unwrap().len(), 2);

  let uri = format!("/api/tickets?user_id={}", bob.user_id);
  let (_, bobs) = call(&state, "GET", &uri, None, None).await;
  let bobs: Vec<Ticket> = decode(bobs);
  assert_eq!(bobs.len(), 2);
  assert!(bobs.iter().all(|t| t.user_id == bob.user_id));
}

// ─── Catalogue ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_admins_manage_products() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let (status, _) = call(
    &state,
    "POST",
    "/api/products",
    Some(&bob.token),
    Some(json!({ "title": "lamp", "barcode": "b", "price_cents": 100 })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let lamp = create_product(&state, &ada.token, "lamp", 1999, &["home"]).await;
  let uri = format!("/api/products/{}", lamp.product_id);
  let (status, _) =
    call(&state, "PUT", &uri, Some(&bob.token), Some(json!({ "price_cents": 1 }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, body) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(decode::<Product>(body).price_cents, 1999);
}

#[tokio::test]
async fn products_create_their_categories() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let mut rx = state.hub.subscribe();

  let lamp = create_product(&state, &ada.token, "lamp", 1999, &["lighting", "home"]).await;
  assert_eq!(lamp.categories, ["home", "lighting"]);
  assert_eq!(rx.try_recv().unwrap(), Event::ProductCreated(lamp.clone()));

  let (status, body) = call(&state, "GET", "/api/categories", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let categories: Vec<Category> = decode(body);
  assert_eq!(categories.len(), 2);
  assert!(categories.iter().all(|c| c.product_ids == [lamp.product_id]));
}

#[tokio::test]
async fn list_products_by_category_and_search() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  create_product(&state, &ada.token, "lamp", 1999, &["home"]).await;
  create_product(&state, &ada.token, "Desk Lamp", 2999, &["office"]).await;
  create_product(&state, &ada.token, "chair", 8999, &["office", "home"]).await;

  let (_, all) = call(&state, "GET", "/api/products", None, None).await;
  assert_eq!(all.as_array().unwrap().len(), 3);

  let (_, office) = call(&state, "GET", "/api/products?category=office", None, None).await;
  let office: Vec<Product> = decode(office);
  assert_eq!(office.len(), 2);
  assert!(office.iter().all(|p| p.categories.iter().any(|c| c == "office")));

  let (_, lamps) = call(&state, "GET", "/api/products?search=lamp", None, None).await;
  assert_eq!(lamps.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn category_names_stay_unique() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/categories",
    Some(&ada.token),
    Some(json!({ "name": "garden" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let garden: Category = decode(body);

  let (status, _) = call(
    &state,
    "POST",
    "/api/categories",
    Some(&ada.token),
    Some(json!({ "name": "garden" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let uri = format!("/api/categories/{}", garden.category_id);
  let (status, body) =
    call(&state, "PUT", &uri, Some(&ada.token), Some(json!({ "name": "outdoor" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "outdoor");
}

#[tokio::test]
async fn out_of_range_price_is_a_bad_request() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;

  let (status, body) = call(
    &state,
    "POST",
    "/api/products",
    Some(&ada.token),
    Some(json!({ "title": "yacht", "barcode": "Y", "price_cents": MAX_CENTS + 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  let uri = format!("/api/products/{}", lamp.product_id);
  let (status, _) = call(
    &state,
    "PUT",
    &uri,
    Some(&ada.token),
    Some(json!({ "price_cents": MAX_CENTS + 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = call(&state, "GET", "/api/products", None, None).await;
  let products: Vec<Product> = decode(body);
  assert_eq!(products.len(), 1);
  assert_eq!(products[0].price_cents, 1999);
}

#[tokio::test]
async fn search_matches_literal_text_in_any_case() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  create_product(&state, &ada.token, "Ärmel", 2999, &[]).await;

  let (_, body) = call(&state, "GET", "/api/products?search=_", None, None).await;
  assert!(body.as_array().unwrap().is_empty(), "{body}");

  let (_, body) = call(&state, "GET", "/api/products?search=%C3%A4rmel", None, None).await;
  let found: Vec<Product> = decode(body);
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].title, "Ärmel");
}

#[tokio::test]
async fn product_updates_and_deletes_are_broadcast() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &["home"]).await;
  let mut rx = state.hub.subscribe();
  let uri = format!("/api/products/{}", lamp.product_id);

  let (status, body) =
    call(&state, "PUT", &uri, Some(&ada.token), Some(json!({ "price_cents": 2500 }))).await;
  assert_eq!(status, StatusCode::OK);
  let updated: Product = decode(body);
  assert_eq!(rx.try_recv().unwrap(), Event::ProductUpdated(updated.clone()));

  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(rx.try_recv().unwrap(), Event::ProductDeleted(updated));
  assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

  let (status, _) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renaming_and_deleting_categories_shows_on_products() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &["home", "sale"]).await;

  let (_, body) = call(&state, "GET", "/api/categories", None, None).await;
  let categories: Vec<Category> = decode(body);
  let id_of = |name: &str| {
    categories
      .iter()
      .find(|c| c.name == name)
      .map(|c| c.category_id)
      .unwrap()
  };
  let home_uri = format!("/api/categories/{}", id_of("home"));
  let sale_uri = format!("/api/categories/{}", id_of("sale"));
  let lamp_uri = format!("/api/products/{}", lamp.product_id);

  let (status, _) =
    call(&state, "PUT", &home_uri, Some(&bob.token), Some(json!({ "name": "house" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) =
    call(&state, "PUT", &home_uri, Some(&ada.token), Some(json!({ "name": "sale" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) =
    call(&state, "PUT", &home_uri, Some(&ada.token), Some(json!({ "name": "house" }))).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = call(&state, "DELETE", &sale_uri, Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&state, "DELETE", &sale_uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, "GET", &sale_uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, body) = call(&state, "GET", &lamp_uri, None, None).await;
  assert_eq!(decode::<Product>(body).categories, ["house"]);
}

#[tokio::test]
async fn tags_group_existing_products() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  let rug = create_product(&state, &ada.token, "rug", 500, &[]).await;

  let body = json!({ "name": "bestseller", "product_ids": [lamp.product_id] });
  let (status, _) = call(&state, "POST", "/api/tags", Some(&bob.token), Some(body.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, created) = call(&state, "POST", "/api/tags", Some(&ada.token), Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  let tag: Tag = decode(created);
  assert_eq!(tag.product_ids, [lamp.product_id]);

  let (status, _) = call(&state, "POST", "/api/tags", Some(&ada.token), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let missing = Uuid::new_v4();
  let (status, body) = call(
    &state,
    "POST",
    "/api/tags",
    Some(&ada.token),
    Some(json!({ "name": "ghosts", "product_ids": [missing] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], format!("product with id {missing} not found"));

  let uri = format!("/api/tags/{}", tag.tag_id);
  let (status, body) = call(
    &state,
    "PUT",
    &uri,
    Some(&ada.token),
    Some(json!({ "product_ids": [rug.product_id, lamp.product_id, rug.product_id] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let updated: Tag = decode(body);
  assert_eq!(updated.name, "bestseller");
  assert_eq!(updated.product_ids.len(), 2);

  let rug_uri = format!("/api/products/{}", rug.product_id);
  call(&state, "DELETE", &rug_uri, Some(&ada.token), None).await;
  let (_, body) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(decode::<Tag>(body).product_ids, [lamp.product_id]);

  let (_, body) = call(&state, "GET", "/api/tags", None, None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_details_are_one_per_product() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  let uri = format!("/api/product-details/{}", lamp.product_id);

  let (status, _) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let body = json!({
    "product_id": lamp.product_id,
    "specifications": "40W, E27",
    "warranty": "2 years",
  });
  let (status, _) =
    call(&state, "POST", "/api/product-details", Some(&bob.token), Some(body.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, created) =
    call(&state, "POST", "/api/product-details", Some(&ada.token), Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  let detail: ProductDetail = decode(created);
  assert_eq!(detail.warranty, "2 years");

  let (status, _) =
    call(&state, "POST", "/api/product-details", Some(&ada.token), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &state,
    "POST",
    "/api/product-details",
    Some(&ada.token),
    Some(json!({ "product_id": Uuid::new_v4() })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    call(&state, "PUT", &uri, Some(&ada.token), Some(json!({ "warranty": "5 years" }))).await;
  assert_eq!(status, StatusCode::OK);
  let updated: ProductDetail = decode(body);
  assert_eq!(updated.specifications, "40W, E27");
  assert_eq!(updated.warranty, "5 years");

  let (_, body) = call(&state, "GET", "/api/product-details", None, None).await;
  assert_eq!(decode::<Vec<ProductDetail>>(body), vec![updated]);

  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, "DELETE", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Orders ───────────────────────────────────────────────────────────────────

async fn place_order(state: &State, token: &str, items: Value) -> (StatusCode, Value) {
  call(state, "POST", "/api/orders", Some(token), Some(json!({ "items": items }))).await
}

#[tokio::test]
async fn order_total_is_quantity_times_current_price() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  let rug = create_product(&state, &ada.token, "rug", 500, &[]).await;

  let (status, body) = place_order(
    &state,
    &bob.token,
    json!([
      { "product_id": lamp.product_id, "quantity": 2 },
      { "product_id": rug.product_id, "quantity": 3 },
    ]),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let order: Order = decode(body);
  assert_eq!(order.user_id, bob.user_id);
  assert_eq!(order.status.as_str(), "Pending");
  assert_eq!(order.total_cents, 2 * 1999 + 3 * 500);

  // A later price change leaves the placed order alone...
  let uri = format!("/api/products/{}", lamp.product_id);
  call(&state, "PUT", &uri, Some(&ada.token), Some(json!({ "price_cents": 2500 }))).await;
  let order_uri = format!("/api/orders/{}", order.order_id);
  let (_, body) = call(&state, "GET", &order_uri, Some(&bob.token), None).await;
  assert_eq!(decode::<Order>(body).total_cents, 2 * 1999 + 3 * 500);

  // ...until its items are updated, which re-prices every line.
  let (status, body) = call(
    &state,
    "PUT",
    &order_uri,
    Some(&bob.token),
    Some(json!({ "items": [{ "product_id": lamp.product_id, "quantity": 1 }] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let repriced: Order = decode(body);
  assert_eq!(repriced.total_cents, 2500);
  assert_eq!(repriced.items[0].price_at_order_cents, 2500);
}

#[tokio::test]
async fn order_with_unknown_product_writes_nothing() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  let missing = Uuid::new_v4();

  let (status, body) = place_order(
    &state,
    &ada.token,
    json!([
      { "product_id": lamp.product_id, "quantity": 1 },
      { "product_id": missing, "quantity": 1 },
    ]),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], format!("product with id {missing} not found"));

  let (_, orders) = call(&state, "GET", "/api/orders", Some(&ada.token), None).await;
  assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;

  let (status, _) =
    place_order(&state, &ada.token, json!([{ "product_id": lamp.product_id, "quantity": 0 }]))
      .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ordering_for_others_needs_admin() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;

  let (status, _) = call(
    &state,
    "POST",
    "/api/orders",
    Some(&bob.token),
    Some(json!({ "user_id": ada.user_id, "items": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(
    &state,
    "POST",
    "/api/orders",
    Some(&ada.token),
    Some(json!({ "user_id": Uuid::new_v4(), "items": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid user id");

  let (status, body) = call(
    &state,
    "POST",
    "/api/orders",
    Some(&ada.token),
    Some(json!({ "user_id": bob.user_id, "items": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(decode::<Order>(body).user_id, bob.user_id);
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let cy = register(&state, "cy").await;

  let (_, body) = place_order(&state, &bob.token, json!([])).await;
  let bobs: Order = decode(body);
  place_order(&state, &cy.token, json!([])).await;

  let (_, mine) = call(&state, "GET", "/api/orders", Some(&bob.token), None).await;
  let mine: Vec<Order> = decode(mine);
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].order_id, bobs.order_id);

  let (_, all) = call(&state, "GET", "/api/orders", Some(&ada.token), None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);

  let uri = format!("/api/orders/{}", bobs.order_id);
  let (status, _) = call(&state, "GET", &uri, Some(&cy.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let uri = format!("/api/orders/user/{}", bob.user_id);
  let (status, _) = call(&state, "GET", &uri, Some(&cy.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, body) = call(&state, "GET", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn order_status_is_admin_only() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let (_, body) = place_order(&state, &bob.token, json!([])).await;
  let order: Order = decode(body);
  let uri = format!("/api/orders/{}/status", order.order_id);

  let (status, _) =
    call(&state, "PUT", &uri, Some(&bob.token), Some(json!({ "status": "Shipped" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let mut rx = state.hub.subscribe();
  let (status, _) =
    call(&state, "PUT", &uri, Some(&ada.token), Some(json!({ "status": "Shipped" }))).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  match rx.try_recv().unwrap() {
    Event::OrderUpdated(updated) => assert_eq!(updated.status.as_str(), "Shipped"),
    other => panic!("unexpected event {}", other.name()),
  }

  let (_, body) = call(&state, "GET", "/api/orders?status=Shipped", Some(&ada.token), None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn order_total_beyond_the_limit_is_a_bad_request() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let yacht = create_product(&state, &ada.token, "yacht", MAX_CENTS, &[]).await;

  let (status, body) =
    place_order(&state, &ada.token, json!([{ "product_id": yacht.product_id, "quantity": 2 }]))
      .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "order total is too large");
}

#[tokio::test]
async fn order_creation_and_deletion_are_broadcast() {
  let state = make_state().await;
  let ada = register(&state, "ada").await;
  let bob = register(&state, "bob").await;
  let cy = register(&state, "cy").await;
  let lamp = create_product(&state, &ada.token, "lamp", 1999, &[]).await;
  let mut rx = state.hub.subscribe();

  let (status, body) =
    place_order(&state, &bob.token, json!([{ "product_id": lamp.product_id, "quantity": 1 }]))
      .await;
  assert_eq!(status, StatusCode::CREATED);
  let order: Order = decode(body);
  assert_eq!(rx.try_recv().unwrap(), Event::OrderCreated(order.clone()));

  let uri = format!("/api/orders/{}", order.order_id);
  let (status, _) = call(&state, "DELETE", &uri, Some(&cy.token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

  let (status, _) = call(&state, "DELETE", &uri, Some(&bob.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(rx.try_recv().unwrap(), Event::OrderDeleted(order));

  let (status, _) = call(&state, "GET", &uri, Some(&ada.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
