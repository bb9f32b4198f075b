// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use hr_management_service::domain::entities::{NewUser, Role};
use hr_management_service::domain::repositories::{InMemoryUserStore, UserStore};
use hr_management_service::infrastructure::config::{
    AppConfig, AuthConfig, LogFormat, LoggingConfig, RateLimitClassSettings, RateLimitSettings,
    RuntimeMode, ServerConfig,
};
use hr_management_service::infrastructure::http::{build_state, create_app};
use hr_management_service::presentation::handlers::AppState;

pub const TEST_JWT_SECRET: &str = "test-signing-secret-at-least-32-characters"; // gitleaks:allow
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const EMPLOYEE_PASSWORD: &str = "employee-password-1";

pub fn test_config() -> AppConfig {
    AppConfig {
        mode: RuntimeMode::Local,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 30,
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            issuer: "hr-management-service".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_multiplier: 7,
            expiry_warning_minutes: 15,
        },
        rate_limit: RateLimitSettings {
            trust_proxy_headers: false,
            max_tracked_clients: 1_000,
            login: RateLimitClassSettings { capacity: 5, window_seconds: 60 },
            register: RateLimitClassSettings { capacity: 3, window_seconds: 300 },
            general_auth: RateLimitClassSettings { capacity: 20, window_seconds: 60 },
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            filter: None,
            format: LogFormat::Pretty,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Build the full application with an admin and an employee account
    /// already present in the store.
    pub async fn spawn() -> Self {
        Self::spawn_with_config(test_config()).await
    }

    pub async fn spawn_with_config(config: AppConfig) -> Self {
        let users = Arc::new(InMemoryUserStore::new());

        users
            .insert(NewUser {
                username: "admin".to_string(),
                password: ADMIN_PASSWORD.to_string(),
                roles: vec![Role::Admin, Role::Hr],
            })
            .await
            .unwrap();
        users
            .insert(NewUser {
                username: "employee".to_string(),
                password: EMPLOYEE_PASSWORD.to_string(),
                roles: vec![Role::Employee],
            })
            .await
            .unwrap();

        let state = build_state(&config, users).unwrap();
        let router = create_app(&config, state.clone());

        Self { router, state }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, Body::empty(), &[]).await
    }

    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request("GET", path, Body::empty(), headers).await
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        self.post_json_with_headers(path, body, &[]).await
    }

    pub async fn post_json_with_headers(
        &self,
        path: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut all_headers = vec![("content-type", "application/json")];
        all_headers.extend_from_slice(headers);
        self.request("POST", path, Body::from(body.to_string()), &all_headers).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Body,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().uri(path).method(method);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(body).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        TestResponse::new(response).await
    }

    /// Log in against the running router and return the token response body.
    pub async fn login(&self, username: &str, password: &str) -> serde_json::Value {
        let response = self
            .post_json(
                "/api/v1/auth/login",
                &serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        response.assert_status(StatusCode::OK);
        response.json()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await["access_token"].as_str().unwrap().to_string()
    }

    pub async fn employee_token(&self) -> String {
        self.login("employee", EMPLOYEE_PASSWORD).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();

        Self { status, headers, body }
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(self.status, expected, "Response body: {}", self.body);
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
