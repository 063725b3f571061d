#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use sqlx::PgPool;
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const BIN: &str = env!("CARGO_BIN_EXE_shop-catalog-api");

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

        // Inherit environment so the server sees DATABASE_URL; --migrate brings the schema up first
        let child = Command::new(BIN)
            .args(["serve", "--migrate", "--port", &port.to_string()])
            .env("HOST", "127.0.0.1")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
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
}

/// Running server plus a direct pool for seeding shops and categories
pub struct TestEnv {
    pub server: &'static TestServer,
    pub pool: PgPool,
    pub client: reqwest::Client,
}

impl TestEnv {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.base_url, path)
    }

    pub async fn seed_shop(&self, owner: Uuid) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar("INSERT INTO shops (user_id, name) VALUES ($1, $2) RETURNING id")
            .bind(owner)
            .bind(format!("shop-{}", owner))
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn delete_shop(&self, shop_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE shops SET deleted_at = NOW() WHERE id = $1")
            .bind(shop_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn seed_category(&self, name: &str) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// POSTs a product as `actor` and returns the new id
    pub async fn create_product(&self, actor: Uuid, body: serde_json::Value) -> Result<Uuid> {
        let res = self
            .client
            .post(self.url("/products"))
            .header("X-User-Id", actor.to_string())
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        let payload = res.json::<serde_json::Value>().await?;
        let id = payload["data"]["id"].as_str().context("missing id")?;
        Ok(Uuid::parse_str(id)?)
    }
}

/// None when DATABASE_URL is not configured; callers skip in that case
pub async fn setup() -> Result<Option<TestEnv>> {
    let _ = dotenvy::dotenv();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return Ok(None);
        }
    };

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;

    let pool = PgPool::connect(&database_url).await?;
    Ok(Some(TestEnv {
        server,
        pool,
        client: reqwest::Client::new(),
    }))
}
