//! HTTP/JSON front door for the device and user services.
//!
//! Routes under `/api/v1/devices` and `/api/v1/users` sit behind one middleware chain,
//! so both share a rate-limit budget; `/health` and the not-found fallback do not.

pub mod handlers;
pub mod users;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{run_chain, MiddlewareChain};
use crate::rpc::{DeviceRpc, UserRpc};

#[derive(Clone)]
pub struct GatewayState {
    pub devices: Arc<dyn DeviceRpc>,
    pub users: Arc<dyn UserRpc>,
}

impl GatewayState {
    pub fn new(devices: Arc<dyn DeviceRpc>, users: Arc<dyn UserRpc>) -> Self {
        Self { devices, users }
    }
}

pub fn router(state: GatewayState, chain: MiddlewareChain, cors: CorsLayer) -> Router {
    let collection = get(handlers::list_devices)
        .post(handlers::create_device)
        .fallback(handlers::method_not_allowed);
    let item = get(handlers::get_device)
        .put(handlers::update_device)
        .fallback(handlers::method_not_allowed);
    let user_collection = post(users::create_user).fallback(handlers::method_not_allowed);
    let user_item = get(users::get_user)
        .put(users::update_user)
        .delete(users::delete_user)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route("/api/v1/devices", collection.clone())
        .route("/api/v1/devices/", collection)
        .route("/api/v1/devices/:id", item)
        .route("/api/v1/users", user_collection.clone())
        .route("/api/v1/users/", user_collection)
        .route("/api/v1/users/:id", user_item)
        .route_layer(from_fn_with_state(chain, run_chain))
        .with_state(state)
        .route("/health", get(health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{AuthenticationGuard, RateLimiter};
    use crate::rpc::{
        DeleteUserResponse, DeviceMessage, ListDevicesResponse, MockDeviceRpc, MockUserRpc,
        RpcCode, RpcStatus, UserMessage,
    };
    use crate::testing::bearer_token;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;

    const SECRET: &str = "gateway-test-secret";

    fn device(id: &str, state: &str) -> DeviceMessage {
        let now = Utc::now();
        DeviceMessage {
            id: id.to_string(),
            name: "Lamp".to_string(),
            device_type: "Actuator".to_string(),
            state: state.to_string(),
            user_id: "u1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: &str, name: &str) -> UserMessage {
        let now = Utc::now();
        UserMessage {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            created_at: now,
            updated_at: now,
        }
    }

    fn auth_only() -> MiddlewareChain {
        MiddlewareChain::new().stage(AuthenticationGuard::new(SECRET))
    }

    fn app_with(devices: MockDeviceRpc, users: MockUserRpc, chain: MiddlewareChain) -> Router {
        let state = GatewayState::new(Arc::new(devices), Arc::new(users));
        router(state, chain, cors_layer(&[]))
    }

    fn app(mock: MockDeviceRpc) -> Router {
        app_with(mock, MockUserRpc::new(), auth_only())
    }

    fn user_app(users: MockUserRpc) -> Router {
        app_with(MockDeviceRpc::new(), users, auth_only())
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", bearer_token(SECRET, "u1")))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn missing_authorization_never_reaches_backend() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_create_device().times(0);
        mock.expect_list_devices().times(0);

        let request = Request::post("/api/v1/devices")
            .body(Body::from(r#"{"name":"Lamp"}"#))
            .unwrap();
        let (status, body) = send(app(mock), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn create_forwards_body_and_wraps_device() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_create_device()
            .withf(|r| r.name == "Lamp" && r.device_type == "Actuator" && r.user_id == "u1")
            .times(1)
            .returning(|_| Ok(device("d1", "off")));

        let body = r#"{"name":"Lamp","type":"Actuator","user_id":"u1"}"#;
        let (status, body) = send(app(mock), request(Method::POST, "/api/v1/devices", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], "d1");
        assert_eq!(body["data"]["state"], "off");
    }

    #[tokio::test]
    async fn malformed_json_is_400_without_backend_call() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_create_device().times(0);
        mock.expect_update_device_state().times(0);

        let app = app(mock);
        let (status, body) =
            send(app.clone(), request(Method::POST, "/api/v1/devices", "{\"name\":")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_JSON");

        let (status, _) = send(app, request(Method::PUT, "/api/v1/devices/d1", "not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_takes_id_from_path() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_update_device_state()
            .withf(|r| r.id == "d1" && r.state == "on")
            .times(1)
            .returning(|r| Ok(device(&r.id, &r.state)));

        let (status, body) = send(
            app(mock),
            request(Method::PUT, "/api/v1/devices/d1", r#"{"id":"other","state":"on"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "d1");
        assert_eq!(body["data"]["state"], "on");
    }

    #[tokio::test]
    async fn list_reads_body_or_query_string() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_list_devices()
            .withf(|r| r.user_id == "u1" && r.page == 2 && r.page_size == 3)
            .times(2)
            .returning(|_| {
                Ok(ListDevicesResponse {
                    devices: vec![device("d1", "off")],
                    total: 5,
                })
            });

        let app = app(mock);
        let (status, body) = send(
            app.clone(),
            request(Method::GET, "/api/v1/devices", r#"{"user_id":"u1","page":2,"page_size":3}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 5);

        let uri = "/api/v1/devices/?user_id=u1&page=2&page_size=3";
        let (status, body) = send(app, request(Method::GET, uri, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["devices"][0]["id"], "d1");
    }

    #[tokio::test]
    async fn list_without_body_or_user_filter_is_400_without_backend_call() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_list_devices().times(0);

        let app = app(mock);
        let (status, body) = send(app.clone(), request(Method::GET, "/api/v1/devices", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_JSON");
        assert_eq!(body["message"], "Invalid request body");

        let uri = "/api/v1/devices?page=1&page_size=10";
        let (status, _) = send(app, request(Method::GET, uri, "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rpc_errors_are_translated() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_get_device()
            .returning(|r| match r.id.as_str() {
                "missing" => Err(RpcStatus::not_found("device missing not found")),
                "bad" => Err(RpcStatus::invalid_argument("id is malformed")),
                _ => Err(RpcStatus::new(RpcCode::Unavailable, "connection refused")),
            });

        let app = app(mock);
        let (status, body) =
            send(app.clone(), request(Method::GET, "/api/v1/devices/missing", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Device not found");

        let (status, body) =
            send(app.clone(), request(Method::GET, "/api/v1/devices/bad", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "id is malformed");

        let (status, body) = send(app, request(Method::GET, "/api/v1/devices/down", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to get device");
    }

    #[tokio::test]
    async fn wrong_method_is_405_and_unknown_path_is_404() {
        let app = app(MockDeviceRpc::new());

        let (status, body) =
            send(app.clone(), request(Method::DELETE, "/api/v1/devices/d1", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");

        let (status, _) = send(app.clone(), request(Method::PUT, "/api/v1/devices", "{}")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, body) = send(app, request(Method::GET, "/api/v1/gadgets", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn rate_limit_runs_before_auth() {
        let mut mock = MockDeviceRpc::new();
        mock.expect_get_device().times(0);

        let chain = MiddlewareChain::new()
            .stage(RateLimiter::with_limits(3, 0.0))
            .stage(AuthenticationGuard::new(SECRET));
        let app = app_with(mock, MockUserRpc::new(), chain);

        let mut statuses = Vec::new();
        for _ in 0..5 {
            let unauthenticated = Request::get("/api/v1/devices/d1").body(Body::empty()).unwrap();
            let (status, _) = send(app.clone(), unauthenticated).await;
            statuses.push(status);
        }

        let limited = statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count();
        let unauthorized = statuses.iter().filter(|s| **s == StatusCode::UNAUTHORIZED).count();
        assert_eq!(limited, 2);
        assert_eq!(unauthorized, 3);
    }

    #[tokio::test]
    async fn device_and_user_routes_share_one_rate_limit_budget() {
        let mut devices = MockDeviceRpc::new();
        devices
            .expect_get_device()
            .times(2)
            .returning(|r| Ok(device(&r.id, "off")));
        let mut users = MockUserRpc::new();
        users
            .expect_get_user()
            .times(1)
            .returning(|r| Ok(user(&r.id, "Ada")));

        let chain = MiddlewareChain::new()
            .stage(RateLimiter::with_limits(3, 0.0))
            .stage(AuthenticationGuard::new(SECRET));
        let app = app_with(devices, users, chain);

        let (status, _) = send(app.clone(), request(Method::GET, "/api/v1/devices/d1", "")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app.clone(), request(Method::GET, "/api/v1/users/u1", "")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app.clone(), request(Method::GET, "/api/v1/devices/d2", "")).await;
        assert_eq!(status, StatusCode::OK);

        // Bucket drained by the mix above
        let (status, _) = send(app.clone(), request(Method::GET, "/api/v1/users/u2", "")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let (status, _) = send(app, request(Method::GET, "/api/v1/devices/d3", "")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn user_routes_require_authorization() {
        let mut users = MockUserRpc::new();
        users.expect_create_user().times(0);
        users.expect_get_user().times(0);

        let app = user_app(users);
        let request = Request::post("/api/v1/users")
            .body(Body::from(r#"{"name":"Ada"}"#))
            .unwrap();
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::get("/api/v1/users/u1").body(Body::empty()).unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_user_is_201_and_forwards_body() {
        let mut users = MockUserRpc::new();
        users
            .expect_create_user()
            .withf(|r| r.name == "Ada" && r.email == "ada@example.com" && r.password == "pw")
            .times(1)
            .returning(|r| Ok(user("u9", &r.name)));

        let body = r#"{"name":"Ada","email":"ada@example.com","password":"pw"}"#;
        let (status, body) =
            send(user_app(users), request(Method::POST, "/api/v1/users/", body)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], "u9");
        assert_eq!(body["data"]["name"], "Ada");
    }

    #[tokio::test]
    async fn update_user_takes_id_from_path_and_translates_errors() {
        let mut users = MockUserRpc::new();
        users
            .expect_update_user()
            .withf(|r| r.id == "u1" && r.name == "Grace")
            .times(1)
            .returning(|r| Ok(user(&r.id, &r.name)));
        users
            .expect_update_user()
            .withf(|r| r.id == "missing")
            .returning(|_| Err(RpcStatus::not_found("no such user")));
        users
            .expect_update_user()
            .withf(|r| r.id == "u2")
            .returning(|_| Err(RpcStatus::invalid_argument("email is taken")));

        let app = user_app(users);
        let body = r#"{"id":"other","name":"Grace","email":"g@example.com"}"#;
        let (status, reply) =
            send(app.clone(), request(Method::PUT, "/api/v1/users/u1", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["data"]["id"], "u1");
        assert_eq!(reply["data"]["name"], "Grace");

        let (status, reply) =
            send(app.clone(), request(Method::PUT, "/api/v1/users/missing", body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(reply["message"], "User not found");

        let (status, reply) =
            send(app.clone(), request(Method::PUT, "/api/v1/users/u2", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["message"], "email is taken");

        let (status, reply) = send(app, request(Method::PUT, "/api/v1/users/u1", "{bad")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn get_and_delete_user() {
        let mut users = MockUserRpc::new();
        users
            .expect_get_user()
            .returning(|r| match r.id.as_str() {
                "u1" => Ok(user("u1", "Ada")),
                "missing" => Err(RpcStatus::not_found("no such user")),
                _ => Err(RpcStatus::new(RpcCode::Unavailable, "connection refused")),
            });
        users
            .expect_delete_user()
            .withf(|r| r.id == "u1")
            .times(1)
            .returning(|_| Ok(DeleteUserResponse { success: true }));

        let app = user_app(users);
        let (status, body) = send(app.clone(), request(Method::GET, "/api/v1/users/u1", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "u1@example.com");

        let (status, body) =
            send(app.clone(), request(Method::GET, "/api/v1/users/missing", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) =
            send(app.clone(), request(Method::GET, "/api/v1/users/down", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to get user");

        let (status, body) = send(app, request(Method::DELETE, "/api/v1/users/u1", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "User deleted successfully");
    }

    #[tokio::test]
    async fn user_collection_only_accepts_post() {
        let mut users = MockUserRpc::new();
        users.expect_create_user().times(0);

        let app = user_app(users);
        let (status, body) = send(app.clone(), request(Method::GET, "/api/v1/users", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");

        let (status, _) = send(app, request(Method::PATCH, "/api/v1/users/u1", "{}")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app(MockDeviceRpc::new());
        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }
}
