use once_cell::sync::Lazy;
use reqwest::{Client, Method, Response};
use secrecy::SecretString;
use serde_json::Value;
use std::net::TcpListener;
use std::sync::Arc;

use tournament_backend::config::jwt::JwtSettings;
use tournament_backend::config::settings::AdminSettings;
use tournament_backend::db::MemoryGateway;
use tournament_backend::run;
use tournament_backend::telemetry::{get_subscriber, init_subscriber};

pub const ADMIN_USERNAME: &str = "organizer";
pub const ADMIN_PASSWORD: &str = "grand-final-2026";
pub const JWT_SECRET: &str = "integration-test-secret";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

// Cost 4 keeps the hash cheap; every test app shares it
static ADMIN_PASSWORD_HASH: Lazy<String> =
    Lazy::new(|| bcrypt::hash(ADMIN_PASSWORD, 4).expect("Failed to hash admin password"));

pub struct TestApp {
    pub address: String,
    pub gateway: Arc<MemoryGateway>,
}

pub async fn spawn_app() -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let gateway = Arc::new(MemoryGateway::new());
    let admin = AdminSettings {
        username: ADMIN_USERNAME.to_string(),
        password_hash: SecretString::new(ADMIN_PASSWORD_HASH.clone().into_boxed_str()),
    };

    let server = run(
        listener,
        gateway.clone(),
        JwtSettings::new(JWT_SECRET.to_string(), 1),
        admin,
        None,
        vec!["http://localhost:3000".to_string()],
    )
    .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp { address, gateway }
}

/// Log in with the configured admin account and return the bearer token
pub async fn login_admin(app_address: &str) -> String {
    let response = Client::new()
        .post(format!("{}/login", app_address))
        .json(&serde_json::json!({
            "username": ADMIN_USERNAME,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute login request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

pub async fn make_authenticated_request(
    client: &Client,
    method: Method,
    url: &str,
    token: &str,
    body: Option<Value>,
) -> Response {
    let mut request = client
        .request(method, url)
        .header("Authorization", format!("Bearer {}", token));
    if let Some(body) = body {
        request = request.json(&body);
    }
    request.send().await.expect("Failed to execute request.")
}
