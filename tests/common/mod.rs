#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;
use tradepost::db::Database;
use tradepost::jwt::JwtConfig;
use tradepost::password::PasswordService;
use tradepost::{ServerConfig, create_app};

pub const ACCESS_SECRET: &[u8] = b"integration-access-secret-0123456789";
pub const REFRESH_SECRET: &[u8] = b"integration-refresh-secret-0123456789";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
}

/// A parsed response: status, JSON body, and the refresh cookie if one was set.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
    pub refresh_cookie: Option<String>,
}

impl TestResponse {
    pub fn data(&self) -> &serde_json::Value {
        &self.body["data"]
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or("")
    }

    pub fn access_token(&self) -> String {
        self.data()["access"]
            .as_str()
            .expect("response should carry an access token")
            .to_string()
    }
}

pub async fn setup() -> TestApp {
    let db = Database::open(":memory:").await.unwrap();
    let config = ServerConfig {
        db: db.clone(),
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
        secure_cookies: false,
        // Low argon2 costs keep the suite fast; production uses defaults.
        passwords: PasswordService::with_params(8, 1, 1).unwrap(),
    };
    TestApp {
        app: create_app(&config),
        db,
    }
}

/// Token service wired with the test secrets, for inspecting issued claims.
pub fn jwt() -> JwtConfig {
    JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET)
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let refresh_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookie| {
                let (name, rest) = cookie.split_once('=')?;
                (name == "refresh").then(|| rest.split(';').next().unwrap_or("").to_string())
            });

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body should be JSON")
        };

        TestResponse {
            status,
            body,
            refresh_cookie,
        }
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST with a bearer access token. The Authorization header carries the
    /// raw token, no scheme prefix.
    pub async fn post_auth(
        &self,
        path: &str,
        access_token: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::AUTHORIZATION, access_token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST carrying a refresh cookie and no body.
    pub async fn post_with_refresh_cookie(&self, path: &str, refresh: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::COOKIE, format!("refresh={}", refresh))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Register an account and return the raw response for inspection.
    pub async fn register(&self, name: &str, password: &str) -> TestResponse {
        self.post(
            "/auth/register",
            serde_json::json!({ "name": name, "password": password }),
        )
        .await
    }
}
