//! Integration tests for the bookstore storefront.
//!
//! # Running Tests
//!
//! The tests need a disposable `PostgreSQL` database. Migrations are applied
//! automatically.
//!
//! ```bash
//! export TEST_DATABASE_URL=postgres://localhost/bookstore_test
//! cargo test -p bookstore-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_ledger` - Cart repository behavior (clamping, merge, concurrency)
//! - `checkout` - Order creation atomicity and history
//! - `storefront_api` - HTTP API against an in-process server
//!
//! Every test creates its own products, users and session ids, so tests can
//! share one database and run in parallel.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr};

use secrecy::SecretString;
use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use bookstore_core::{CartOwner, Price, ProductId, SessionId, UserId};
use bookstore_storefront::config::StorefrontConfig;
use bookstore_storefront::db::{self, ProductRepository};
use bookstore_storefront::models::NewProduct;
use bookstore_storefront::services::auth::AuthService;
use bookstore_storefront::state::AppState;

/// Connection to the test database plus helpers for building fixtures.
pub struct TestContext {
    pub pool: PgPool,
    database_url: SecretString,
}

impl TestContext {
    /// Connect to `TEST_DATABASE_URL` and apply migrations.
    pub async fn new() -> Self {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .map(SecretString::from)
            .expect("TEST_DATABASE_URL must be set for integration tests");

        let pool = db::create_pool(&database_url, 20)
            .await
            .expect("Failed to connect to test database");
        db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool, database_url }
    }

    /// Insert a product with a unique SKU.
    pub async fn product(&self, name: &str, price_cents: i64, stock: i32) -> ProductId {
        let product = NewProduct {
            sku: Some(format!("TEST-{}", Uuid::new_v4())),
            name: name.to_owned(),
            description: String::new(),
            price: Price::from_cents(price_cents),
            stock_quantity: stock,
            image_url: None,
        };

        ProductRepository::new(&self.pool)
            .create(&product)
            .await
            .expect("Failed to create product")
            .id
    }

    /// Overwrite a product's stock level.
    pub async fn set_stock(&self, product_id: ProductId, stock: i32) {
        sqlx::query("UPDATE storefront.product SET stock_quantity = $2 WHERE id = $1")
            .bind(product_id)
            .bind(stock)
            .execute(&self.pool)
            .await
            .expect("Failed to set stock");
    }

    /// Current stock level of a product.
    pub async fn stock(&self, product_id: ProductId) -> i32 {
        ProductRepository::new(&self.pool)
            .stock(product_id)
            .await
            .expect("Failed to read stock")
            .expect("Product should exist")
    }

    /// Register a user with a unique email and return its ID.
    pub async fn user(&self) -> UserId {
        let (id, _, _) = self.user_with_credentials().await;
        id
    }

    /// Register a user and return its ID, email and password.
    pub async fn user_with_credentials(&self) -> (UserId, String, String) {
        let email = unique_email();
        let password = "correct horse battery".to_owned();
        let user = AuthService::new(&self.pool)
            .register_with_password(&email, &password, Some("Test Reader"))
            .await
            .expect("Failed to register user");
        (user.id, email, password)
    }

    /// Raw row count of an owner's cart lines for one product.
    pub async fn line_rows(&self, owner: &CartOwner, product_id: ProductId) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM storefront.cart_item
            WHERE product_id = $1
              AND (user_id = $2 OR session_id = $3)
            ",
        )
        .bind(product_id)
        .bind(owner.user_id())
        .bind(owner.session_id())
        .fetch_one(&self.pool)
        .await
        .expect("Failed to count cart rows")
    }

    /// Start the storefront on an ephemeral port and return its base URL.
    pub async fn spawn_app(&self) -> Url {
        let listener = tokio::net::TcpListener::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url: Url = format!("http://{addr}")
            .parse()
            .expect("Invalid test base URL");

        let config = StorefrontConfig {
            database_url: self.database_url.clone(),
            db_max_connections: 5,
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let app = bookstore_storefront::app(AppState::new(config, self.pool.clone()));

        tokio::spawn(async move {
            axum_serve(listener, app).await;
        });

        base_url
    }
}

async fn axum_serve(listener: tokio::net::TcpListener, app: axum::Router) {
    axum::serve(listener, app)
        .await
        .expect("Test server failed");
}

/// A fresh anonymous cart owner.
#[must_use]
pub fn session_owner() -> CartOwner {
    CartOwner::Session(SessionId::generate())
}

/// A unique, valid email address.
#[must_use]
pub fn unique_email() -> String {
    format!("reader-{}@example.com", Uuid::new_v4())
}

/// An HTTP client that keeps cookies between requests, like a browser.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
