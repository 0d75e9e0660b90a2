#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use smarthome::auth::{generate_jwt, Claims};
use smarthome::device::store::{InMemoryReadStore, InMemorySystemOfRecord};
use smarthome::device::{CombinedRepository, DeviceService};
use smarthome::gateway::{self, GatewayState};
use smarthome::middleware::{AuthenticationGuard, MiddlewareChain, RateLimiter};
use smarthome::rpc::{
    server, CreateUserRequest, DeleteUserRequest, DeleteUserResponse, DeviceRpcClient,
    GetUserRequest, RpcStatus, UpdateUserRequest, UserMessage, UserRpc, UserRpcClient,
};

pub const SECRET: &str = "integration-secret";

/// Stand-in for the external user service
#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<String, UserMessage>>,
}

impl InMemoryUsers {
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }
}

fn user_not_found(id: &str) -> RpcStatus {
    RpcStatus::not_found(format!("user {} not found", id))
}

#[async_trait]
impl UserRpc for InMemoryUsers {
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserMessage, RpcStatus> {
        if request.email.is_empty() {
            return Err(RpcStatus::invalid_argument("email is required"));
        }
        let now = Utc::now();
        let user = UserMessage {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name,
            email: request.email,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().await.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, request: GetUserRequest) -> Result<UserMessage, RpcStatus> {
        let users = self.users.lock().await;
        users.get(&request.id).cloned().ok_or_else(|| user_not_found(&request.id))
    }

    async fn update_user(&self, request: UpdateUserRequest) -> Result<UserMessage, RpcStatus> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&request.id).ok_or_else(|| user_not_found(&request.id))?;
        user.name = request.name;
        user.email = request.email;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(
        &self,
        request: DeleteUserRequest,
    ) -> Result<DeleteUserResponse, RpcStatus> {
        match self.users.lock().await.remove(&request.id) {
            Some(_) => Ok(DeleteUserResponse { success: true }),
            None => Err(user_not_found(&request.id)),
        }
    }
}

/// Device service, user service stand-in and gateway, in-process on ephemeral ports
pub struct TestStack {
    pub base_url: String,
    pub rpc_url: String,
    pub user_rpc_url: String,
    pub system_of_record: Arc<InMemorySystemOfRecord>,
    pub read_store: Arc<InMemoryReadStore>,
    pub users: Arc<InMemoryUsers>,
}

impl TestStack {
    pub fn users_url(&self) -> String {
        format!("{}/api/v1/users", self.base_url)
    }

    pub fn user_url(&self, id: &str) -> String {
        format!("{}/api/v1/users/{}", self.base_url, id)
    }

    pub fn devices_url(&self) -> String {
        format!("{}/api/v1/devices", self.base_url)
    }

    pub fn device_url(&self, id: &str) -> String {
        format!("{}/api/v1/devices/{}", self.base_url, id)
    }
}

async fn serve(app: Router) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await.context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server stopped: {e}");
        }
    });
    Ok(format!("http://{}", addr))
}

/// Gateway in front of the two backends. `rate_limit` is (capacity, refill per second).
pub async fn spawn_gateway(
    rpc_url: &str,
    user_rpc_url: &str,
    rate_limit: Option<(u32, f64)>,
) -> Result<String> {
    let devices = DeviceRpcClient::new(rpc_url)?;
    let users = UserRpcClient::new(user_rpc_url)?;

    let mut chain = MiddlewareChain::new();
    if let Some((capacity, refill_per_sec)) = rate_limit {
        chain = chain.stage(RateLimiter::with_limits(capacity, refill_per_sec));
    }
    let chain = chain.stage(AuthenticationGuard::new(SECRET));

    let state = GatewayState::new(Arc::new(devices), Arc::new(users));
    let app = gateway::router(state, chain, gateway::cors_layer(&[]));
    serve(app).await
}

pub async fn spawn_stack(rate_limit: Option<(u32, f64)>) -> Result<TestStack> {
    let system_of_record = Arc::new(InMemorySystemOfRecord::new());
    let read_store = Arc::new(InMemoryReadStore::new());
    let repository =
        Arc::new(CombinedRepository::new(system_of_record.clone(), read_store.clone()));
    let service = Arc::new(DeviceService::new(repository.clone(), repository));
    let users = Arc::new(InMemoryUsers::default());

    let rpc_url = serve(server::router(service, || async { Ok(()) })).await?;
    let user_rpc_url = serve(server::user_router(users.clone())).await?;
    let base_url = spawn_gateway(&rpc_url, &user_rpc_url, rate_limit).await?;

    Ok(TestStack {
        base_url,
        rpc_url,
        user_rpc_url,
        system_of_record,
        read_store,
        users,
    })
}

pub fn token(user_id: &str) -> String {
    let claims = Claims::new(user_id, 1).expect("claims");
    generate_jwt(&claims, SECRET).expect("token generation")
}

pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", token(user_id))
}
