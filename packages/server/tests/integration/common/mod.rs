use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::Value;
use tempfile::TempDir;

use chat_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use chat_server::entity::{channel, server_member, user};
use chat_server::state::AppState;
use ::common::storage::filesystem::FilesystemFileStore;

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const SERVERS: &str = "/api/v1/servers";

    pub fn category(id: i32) -> String {
        format!("/api/v1/categories/{id}")
    }

    pub fn category_icon(id: i32) -> String {
        format!("/api/v1/categories/{id}/icon")
    }

    pub fn server(id: i32) -> String {
        format!("/api/v1/servers/{id}")
    }

    pub fn server_members(id: i32) -> String {
        format!("/api/v1/servers/{id}/members")
    }

    pub fn server_channels(id: i32) -> String {
        format!("/api/v1/servers/{id}/channels")
    }

    pub fn channel(id: i32) -> String {
        format!("/api/v1/channels/{id}")
    }
}

/// A running test server backed by in-memory SQLite and a temporary media root.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub media: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        chat_server::database::create_schema(&db)
            .await
            .expect("Failed to create schema");

        let media = tempfile::tempdir().expect("Failed to create media dir");
        let max_file_size = 64 * 1024;

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
            },
            storage: StorageConfig {
                root: media.path().display().to_string(),
                max_file_size,
            },
            admin: None,
        };

        let file_store = FilesystemFileStore::new(media.path().to_path_buf(), max_file_size)
            .await
            .expect("Failed to create file store");

        let state = AppState {
            db: db.clone(),
            file_store: Arc::new(file_store),
            config: Arc::new(app_config),
        };

        let app = chat_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            media,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn put_file_with_token(
        &self,
        path: &str,
        file_name: &str,
        file_bytes: Vec<u8>,
        token: &str,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Register a user and log in, returning the auth token.
    pub async fn create_authenticated_user(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });

        let reg = self.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        self.login(&body).await
    }

    /// Register a user, promote it to administrator, then log in.
    pub async fn create_admin(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });

        let reg = self.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let db_user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found after registration");

        let mut active: user::ActiveModel = db_user.into();
        active.is_admin = Set(true);
        active
            .update(&self.db)
            .await
            .expect("Failed to promote user");

        self.login(&body).await
    }

    async fn login(&self, body: &Value) -> String {
        let res = self.post_without_token(routes::LOGIN, body).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Create a category via the API and return its `id`.
    pub async fn create_category(&self, admin_token: &str, name: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::CATEGORIES,
                &serde_json::json!({ "name": name }),
                admin_token,
            )
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
        res.id()
    }

    /// Create a server via the API and return its `id`.
    pub async fn create_server(&self, token: &str, name: &str, category_id: i32) -> i32 {
        let res = self
            .post_with_token(
                routes::SERVERS,
                &serde_json::json!({ "name": name, "category_id": category_id }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_server failed: {}", res.text);
        res.id()
    }

    /// Join a server as the token's user.
    pub async fn join_server(&self, server_id: i32, token: &str) {
        let res = self
            .post_with_token(
                &routes::server_members(server_id),
                &serde_json::json!({}),
                token,
            )
            .await;
        assert_eq!(res.status, 204, "join_server failed: {}", res.text);
    }

    /// Create a channel in `server_id` via the API and return its `id`.
    pub async fn create_channel(&self, token: &str, server_id: i32, name: &str) -> i32 {
        let res = self
            .post_with_token(
                &routes::server_channels(server_id),
                &serde_json::json!({ "name": name, "topic": "" }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_channel failed: {}", res.text);
        res.id()
    }

    /// Number of channel and membership rows still pointing at `server_id`.
    pub async fn dependent_rows(&self, server_id: i32) -> (usize, usize) {
        let channels = channel::Entity::find()
            .filter(channel::Column::ServerId.eq(server_id))
            .all(&self.db)
            .await
            .unwrap()
            .len();
        let members = server_member::Entity::find()
            .filter(server_member::Column::ServerId.eq(server_id))
            .all(&self.db)
            .await
            .unwrap()
            .len();
        (channels, members)
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    /// Ids of a JSON array of objects, in order.
    pub fn ids(&self) -> Vec<i32> {
        self.body
            .as_array()
            .expect("response body should be an array")
            .iter()
            .map(|v| v["id"].as_i64().expect("element should contain 'id'") as i32)
            .collect()
    }
}
