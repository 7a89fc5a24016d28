//! Shared harness: the full router on an ephemeral port, backed by the
//! in-memory collaborators from dadaba-notify.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dadaba_api::{router, ApiConfig, AppState, RateLimitConfig};
use dadaba_core::{Dish, Role};
use dadaba_notify::{
    FanoutConfig, FanoutEmitter, GatewayConfig, InMemoryNotificationStore, InMemoryOrderStore,
    InMemoryUserDirectory, JwtVerifier, PushGateway, PushTargeting, RecordingMailer,
};
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-for-testing";

pub struct TestServer {
    pub base_url: String,
    pub users: Arc<InMemoryUserDirectory>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub gateway: PushGateway,
    pub verifier: JwtVerifier,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(PushTargeting::Group).await
    }

    pub async fn spawn_with(targeting: PushTargeting) -> Self {
        Self::spawn_configured(targeting, GatewayConfig::default()).await
    }

    pub async fn spawn_configured(targeting: PushTargeting, gateway_config: GatewayConfig) -> Self {
        let users = Arc::new(InMemoryUserDirectory::new());
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let orders = Arc::new(InMemoryOrderStore::new(users.clone()));
        let mailer = Arc::new(RecordingMailer::new());
        let verifier = JwtVerifier::new(TEST_SECRET, users.clone());

        let gateway = PushGateway::new(Arc::new(verifier.clone()), gateway_config);
        let emitter = FanoutEmitter::new(
            notifications.clone(),
            users.clone(),
            Arc::new(gateway.clone()),
            mailer.clone(),
            FanoutConfig::default().with_targeting(targeting),
        );

        let config = ApiConfig {
            rate_limit: RateLimitConfig::disabled(),
            ..ApiConfig::default()
        };
        let state = AppState::new(notifications.clone(), orders.clone(), gateway.clone(), emitter)
            .with_rate_limit(&config.rate_limit);
        let app = router(state, &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            users,
            notifications,
            orders,
            gateway,
            verifier,
            mailer,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn ws_url(&self, token: &str) -> String {
        format!(
            "{}/api/ws?token={}",
            self.base_url.replace("http://", "ws://"),
            token
        )
    }

    /// Create an account and return its id with a signed token.
    pub async fn user(&self, name: &str, role: Role) -> (Uuid, String) {
        let email = format!("{}@dadaba.test", name.to_lowercase());
        let id = self.users.insert(name, &email, role).await;
        let token = self.verifier.issue(id).unwrap();
        (id, token)
    }

    pub async fn dish(&self, name: &str, price: f64) -> Dish {
        self.orders.add_dish(name, price).await
    }

    /// Place a one-line order as the holder of `token`.
    pub async fn place_order(&self, token: &str, dish: &Dish, quantity: i32) -> reqwest::Response {
        self.client
            .post(self.url("/api/orders"))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "items": [{ "dishId": dish.id, "quantity": quantity }],
                "deliveryName": "Awa",
                "deliveryPhone": "+221700000000",
                "deliveryLocation": "Plateau"
            }))
            .send()
            .await
            .unwrap()
    }

    /// Wait until the store holds at least `count` rows.
    pub async fn wait_for_rows(&self, count: usize) -> usize {
        for _ in 0..100 {
            let rows = self.notifications.all().await.len();
            if rows >= count {
                return rows;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.notifications.all().await.len()
    }

    /// Wait until the gateway has `count` live connections.
    pub async fn wait_for_connections(&self, count: usize) {
        for _ in 0..100 {
            if self.gateway.live_connections() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(self.gateway.live_connections(), count);
    }
}
