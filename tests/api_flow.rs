// tests/api_flow.rs
//
// Black-box checks against the assembled router: signup opens a session,
// the session cookie scopes every tenant operation, and validation and
// conflict failures surface with the right status codes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use taproom::config::AppState;
use taproom::storage::{MemStorage, TenantDeletePolicy};

fn test_app() -> axum::Router {
    let state = AppState {
        storage: Arc::new(MemStorage::new(TenantDeletePolicy::Restrict)),
        session_ttl: chrono::Duration::hours(24),
    };
    taproom::app(state)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn signup_body(username: &str, brewery_name: &str) -> Value {
    json!({
        "user": {
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter22",
            "firstName": "Test",
            "lastName": "Brewer",
        },
        "brewery": {
            "name": brewery_name,
            "type": "microbrewery",
            "location": "Bend, OR",
        },
    })
}

/// Runs signup and returns the session cookie pair (`taproom_sid=...`).
async fn signup(app: &axum::Router, username: &str, brewery_name: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/signup",
            None,
            signup_body(username, brewery_name),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("signup must set a session cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn health_check_is_public() {
    let app = test_app();
    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app();
    let response = app
        .oneshot(Request::get("/api/inventory").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_me() {
    let app = test_app();
    let cookie = signup(&app, "founder", "Crooked Kettle").await;

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/auth/user")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["user"]["username"], "founder");
    assert_eq!(body["user"]["role"], "owner");
    assert_eq!(body["brewery"]["name"], "Crooked Kettle");
    // The password hash never leaves the server.
    assert!(body["user"].get("password").is_none());

    // A fresh login with the same credentials works too.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({"username": "founder", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({"username": "founder", "password": "wrong-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let app = test_app();
    signup(&app, "dupe", "First Brewery").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/signup",
            None,
            signup_body("dupe", "Second Brewery"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn inventory_crud_is_tenant_scoped() {
    let app = test_app();
    let cookie_a = signup(&app, "brewer-a", "Alpha Ales").await;
    let cookie_b = signup(&app, "brewer-b", "Beta Brews").await;

    // Tenant A creates an item; the brewery reference comes from the
    // session, not from the payload.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/inventory",
            Some(&cookie_a),
            json!({
                "name": "Cascade Hops",
                "quantity": 5,
                "currentQuantity": 5,
                "minimumQuantity": 2,
                "unit": "kg",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    let item_id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "good");
    assert_eq!(created["forecast"], "Sufficient");

    // Tenant A sees exactly the one item; the tenant-less demo seeds stay
    // out of scoped listings.
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/inventory")
                .header(header::COOKIE, &cookie_a)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let items = response_json(response).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["name"], "Cascade Hops");

    // Tenant B sees none of it.
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/inventory")
                .header(header::COOKIE, &cookie_b)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let items = response_json(response).await;
    assert!(items.as_array().unwrap().is_empty());

    // Partial update through the API only touches the provided fields.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/inventory/{item_id}"),
            Some(&cookie_a),
            json!({"currentQuantity": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["currentQuantity"], 1);
    assert_eq!(updated["quantity"], 5);

    // Delete, then the id is gone.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/inventory/{item_id}"),
            Some(&cookie_a),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::get(format!("/api/inventory/{item_id}"))
                .header(header::COOKIE, &cookie_a)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recipe_without_ingredients_is_rejected() {
    let app = test_app();
    let cookie = signup(&app, "validator", "Validation Brewing").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/recipes",
            Some(&cookie),
            json!({
                "name": "Empty Recipe",
                "ingredients": [],
                "instructions": ["Mash at 152F"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was persisted.
    let response = app
        .oneshot(
            Request::get("/api/recipes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let recipes = response_json(response).await;
    assert!(recipes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn schedule_flow_resolves_recipe_reference() {
    let app = test_app();
    let cookie = signup(&app, "scheduler", "Schedule Brewing").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/recipes",
            Some(&cookie),
            json!({
                "name": "Summer Kolsch",
                "ingredients": ["Pilsner Malt"],
                "instructions": ["Mash at 152F"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let recipe = response_json(response).await;
    let recipe_id = recipe["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/schedules",
            Some(&cookie),
            json!({
                "title": "Summer Kolsch Batch #1",
                "recipeId": recipe_id,
                "startDate": "2024-03-15T00:00:00Z",
                "endDate": "2024-03-25T00:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let schedule = response_json(response).await;
    assert_eq!(schedule["status"], "scheduled");
    assert_eq!(schedule["recipeId"], recipe_id);

    // End before start is a validation failure.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/schedules",
            Some(&cookie),
            json!({
                "title": "Backwards Batch",
                "startDate": "2024-03-25T00:00:00Z",
                "endDate": "2024-03-15T00:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = test_app();
    let cookie = signup(&app, "leaver", "Short Stay Brewing").await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get("/api/auth/user")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
