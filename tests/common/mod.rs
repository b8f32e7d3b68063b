#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use property_api::auth::issue_token;
use property_api::config::SecurityConfig;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

/// Shared with the spawned server so tests can mint bearer tokens
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory backends keep the suite independent of Postgres and Cloudinary
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_property-api"));
        cmd.args(["--store", "memory", "--object-store", "memory"])
            .env("PROPERTY_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("SECURITY_JWT_SECRET", TEST_JWT_SECRET)
            .env("SECURITY_LEGACY_OWNER_DENIED_STATUS", "false")
            .env("API_PUBLIC_BASE_URL", "")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline { break; }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    // Use stable get_or_init and convert init errors into a panic with context.
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Security settings matching the spawned server
pub fn test_security() -> SecurityConfig {
    SecurityConfig {
        cors_origins: vec![],
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiry_hours: 1,
        legacy_owner_denied_status: false,
    }
}

/// `Authorization` header value for `user`
pub fn bearer(user: &str) -> String {
    let token = issue_token(user, &test_security()).expect("failed to issue test token");
    format!("Bearer {}", token)
}

/// Unique suffix so tests sharing one server do not see each other's data
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Listing form with the required fields plus a city and one amenity
pub fn listing_form(name: &str, property_type: &str, city: &str) -> Form {
    Form::new()
        .text("type", property_type.to_string())
        .text("name", name.to_string())
        .text("description", "Bright rooms close to transit")
        .text("location.street", "12 Main St")
        .text("location.city", city.to_string())
        .text("location.state", "MA")
        .text("location.zipcode", "02110")
        .text("beds", "2")
        .text("baths", "1.5")
        .text("square_feet", "900")
        .text("amenities", "Wifi")
        .text("amenities", "Washer")
        .text("rates.nightly", "120")
        .text("seller_info.name", "Dana")
        .text("seller_info.email", "dana@example.com")
}

pub fn image_part(file_name: &str) -> Part {
    Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("valid mime")
}

/// POST a listing as `user` and return the created property JSON
pub async fn create_listing(server: &TestServer, user: &str, form: Form) -> Result<serde_json::Value> {
    let res = reqwest::Client::new()
        .post(server.url("/properties"))
        .header("Authorization", bearer(user))
        .multipart(form)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "create failed with {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    Ok(body["property"].clone())
}
