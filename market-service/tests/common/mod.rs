#![allow(dead_code)]

use market_service::config::MarketConfig;
use market_service::startup::Application;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GRADING_PATH: &str = "/api/grade-fruit";

/// Smallest valid PNG header, enough for the upload checks.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub grading: MockServer,
    pub upload_dir: TempDir,
}

pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let grading = MockServer::start().await;
        let upload_dir = TempDir::new().expect("Failed to create upload dir");

        let config = MarketConfig::in_memory(
            upload_dir.path().to_string_lossy().to_string(),
            format!("{}{}", grading.uri(), GRADING_PATH),
        );

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::new();

        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
            grading,
            upload_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn register(&self, name: &str, email: &str, role: &str) -> TestUser {
        let response = self
            .post_json(
                "/api/auth/register",
                &json!({
                    "name": name,
                    "email": email,
                    "password": "secret123",
                    "role": role
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.expect("Failed to parse register body");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Answer every grading call with `status` and `body`.
    pub async fn mock_grading(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(GRADING_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.grading)
            .await;
    }

    pub fn image_part() -> reqwest::multipart::Part {
        reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
            .file_name("fruit.png")
            .mime_str("image/png")
            .unwrap()
    }

    pub async fn upload_fruit(&self, name: &str) -> reqwest::Response {
        let form = reqwest::multipart::Form::new()
            .part("image", Self::image_part())
            .text("name", name.to_string())
            .text("collectorId", "collector-1");

        self.client
            .post(self.url("/api/fruits/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_manual_form(&self, fields: &[(&str, &str)]) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new().part("image", Self::image_part());
        for (key, value) in fields {
            form = form.text(key.to_string(), value.to_string());
        }

        self.client
            .post(self.url("/api/fruits/manual"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Add a sellable fruit and return its id.
    pub async fn add_fruit(&self, name: &str, grade: &str, price: f64, quantity: i64) -> String {
        let price = price.to_string();
        let quantity = quantity.to_string();
        let response = self
            .post_manual_form(&[
                ("name", name),
                ("grade", grade),
                ("price", &price),
                ("quantity", &quantity),
                ("collectorId", "collector-1"),
            ])
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.expect("Failed to parse fruit body");
        body["_id"].as_str().unwrap().to_string()
    }

    pub async fn fruit(&self, id: &str) -> Value {
        self.get(&format!("/api/fruits/{}", id))
            .await
            .json()
            .await
            .expect("Failed to parse fruit body")
    }
}
