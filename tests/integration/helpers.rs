//! Shared test helpers for integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use filestore_api::AppState;
use filestore_auth::{Authenticator, TokenService};
use filestore_core::config::AppConfig;
use filestore_core::config::auth::BootstrapAdminConfig;
use filestore_core::config::storage::LocalStorageConfig;
use filestore_core::offload::PersistencePool;
use filestore_core::traits::storage::ObjectStore;
use filestore_database::MemoryDatabase;
use filestore_service::{AdminUserService, EventLedger, FileRegistry, StorageTimeouts, UserService};
use filestore_storage::{LocalObjectStore, MemoryObjectStore};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

const BOUNDARY: &str = "filestore-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing stores, for direct inspection
    pub db: MemoryDatabase,
    /// In-memory object store with fault injection
    pub objects: MemoryObjectStore,
}

impl TestApp {
    /// Create a test application backed entirely by memory.
    pub async fn new() -> Self {
        let objects = MemoryObjectStore::new();
        Self::build(Arc::new(objects.clone()), objects, None).await
    }

    /// Create a test application storing objects under `root`.
    pub async fn with_local_storage(root: &Path) -> Self {
        let local = Arc::new(
            LocalObjectStore::new(&LocalStorageConfig {
                root_path: root.display().to_string(),
                public_base_url: "http://localhost:8080/storage".to_string(),
                signing_secret: "integration-signing-secret".to_string(),
            })
            .await
            .expect("Failed to init local storage"),
        );
        Self::build(local.clone(), MemoryObjectStore::new(), Some(local)).await
    }

    async fn build(
        store: Arc<dyn ObjectStore>,
        objects: MemoryObjectStore,
        local_objects: Option<Arc<LocalObjectStore>>,
    ) -> Self {
        let mut config = AppConfig::default();
        config.storage.provider = "memory".to_string();
        config.auth.bootstrap_admin = Some(BootstrapAdminConfig {
            username: ADMIN_USERNAME.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        });

        let db = MemoryDatabase::new();
        let pool = PersistencePool::current(16).expect("Failed to create persistence pool");
        let tokens = Arc::new(TokenService::from_config(&config.auth).expect("Invalid token config"));

        let users_store = Arc::new(db.clone());
        let authenticator = Arc::new(Authenticator::new(
            Arc::clone(&tokens),
            users_store.clone(),
            pool.clone(),
        ));
        let users = Arc::new(UserService::new(
            users_store.clone(),
            Arc::clone(&tokens),
            pool.clone(),
            config.auth.password_min_length,
        ));
        let admin = Arc::new(AdminUserService::new(
            users_store.clone(),
            pool.clone(),
            config.auth.password_min_length,
        ));
        let files = Arc::new(FileRegistry::new(
            Arc::new(db.clone()),
            store,
            pool.clone(),
            StorageTimeouts {
                upload: Duration::from_millis(500),
                presign: Duration::from_millis(500),
                delete: Duration::from_millis(500),
                download_ttl: Duration::from_secs(900),
            },
        ));
        let events = Arc::new(EventLedger::new(Arc::new(db.clone()), pool.clone()));

        admin
            .ensure_bootstrap_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Failed to create bootstrap admin");

        let state = AppState {
            config: Arc::new(config),
            authenticator,
            users,
            admin,
            files,
            events,
            user_store: users_store,
            pool,
            local_objects,
        };

        Self {
            router: filestore_api::build_router(state),
            db,
            objects,
        }
    }

    /// Register a user and return their token and ID
    pub async fn register(&self, username: &str, password: &str) -> (String, Uuid) {
        let response = self
            .request(
                "POST",
                "/auth/register",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );
        (response.token(), response.uuid("userId"))
    }

    /// Login and return the bearer token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/auth/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response.token()
    }

    /// Token of the bootstrap administrator
    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Create a user with the given roles through the admin API and return
    /// their token and ID
    pub async fn user_with_roles(&self, username: &str, roles: &[&str]) -> (String, Uuid) {
        let admin = self.admin_token().await;
        let response = self
            .request(
                "POST",
                "/users",
                Some(json!({ "username": username, "password": "password1", "roles": roles })),
                Some(&admin),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Create user failed: {:?}",
            response.body
        );
        let id = response.uuid("id");
        (self.login(username, "password1").await, id)
    }

    /// Upload `content` as the multipart field `file`
    pub async fn upload(&self, token: &str, filename: &str, content: &[u8]) -> TestResponse {
        self.upload_field(token, "file", filename, content).await
    }

    /// Upload and return the new file's ID, asserting success
    pub async fn upload_ok(&self, token: &str, filename: &str, content: &[u8]) -> Uuid {
        let response = self.upload(token, filename, content).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Upload failed: {:?}",
            response.body
        );
        response.uuid("id")
    }

    /// Upload `content` under an arbitrary multipart field name
    pub async fn upload_field(
        &self,
        token: &str,
        field: &str,
        filename: &str,
        content: &[u8],
    ) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Make a JSON HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        let body = match body {
            Some(value) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };

        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        self.send(req.body(body).expect("Failed to build request"))
            .await
    }

    /// Send a fully built request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes: bytes.to_vec(),
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
    /// Raw body
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// The `token` field of an auth response
    pub fn token(&self) -> String {
        self.str("token").to_string()
    }

    /// A string field of the body
    pub fn str(&self, field: &str) -> &str {
        self.body
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("No string '{field}' in {:?}", self.body))
    }

    /// A UUID field of the body
    pub fn uuid(&self, field: &str) -> Uuid {
        self.str(field).parse().expect("Invalid UUID")
    }

    /// The `content` array of a page, or the body itself for plain lists
    pub fn items(&self) -> &Vec<Value> {
        self.body
            .get("content")
            .unwrap_or(&self.body)
            .as_array()
            .unwrap_or_else(|| panic!("Not a list: {:?}", self.body))
    }

    /// The `Location` header
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("No Location header")
    }

    /// Assert the body is the error envelope for `status` at `path`
    pub fn assert_error(&self, status: StatusCode, path: &str) {
        assert_eq!(self.status, status, "Unexpected status: {:?}", self.body);
        assert_eq!(self.body["status"], status.as_u16());
        assert_eq!(
            self.body["error"],
            status.canonical_reason().expect("Known status")
        );
        assert_eq!(self.body["path"], path);
        assert!(self.body["message"].is_string());
        assert!(self.body["timestamp"].is_string());
    }
}
