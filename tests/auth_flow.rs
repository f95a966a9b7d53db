//! End-to-end login flow: detect the logged-out page, log in for a session
//! cookie, re-send, and resume the session from disk in a later process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webgrab::{
    AuthenticatedClient, Authenticator, Client, Credentials, FetchError, PageResponse, RetryPolicy,
};

/// Form-login protocol for the mock site: logged-in pages carry a Logout
/// link, logging in is a credential POST that sets the session cookie.
struct MarkerAuth {
    credentials: Credentials,
    login_url: String,
    logins: AtomicUsize,
}

impl MarkerAuth {
    fn new(server_uri: &str) -> Self {
        Self {
            credentials: Credentials::new("mock-site", "alice", "hunter2"),
            login_url: format!("{server_uri}/login"),
            logins: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Authenticator for MarkerAuth {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn is_logged_in(&self, response: &PageResponse) -> bool {
        response.text().contains("Logout")
    }

    async fn login(&self, client: &Client) -> Result<(), FetchError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        let form = [
            ("user", self.credentials.username()),
            ("pass", self.credentials.password()),
        ];
        let response = client.try_post(&self.login_url, &form).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(FetchError::invalid_credentials(format!(
                "login rejected with status {}",
                response.status()
            )))
        }
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2))
}

async fn mount_site(server: &MockServer) {
    // With the session cookie the account page shows a Logout link; without
    // it, the sign-in prompt. Mount order decides which matches first.
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header_exists("cookie"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<a href=\"/logout\">Logout</a>"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Please sign in"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("user=alice"))
        .respond_with(
            ResponseTemplate::new(200).append_header("set-cookie", "sid=s3cret; Path=/"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_fetch_logs_in_and_resends() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let temp = TempDir::new().unwrap();
    let client =
        AuthenticatedClient::with_policy(MarkerAuth::new(&server.uri()), temp.path(), fast_policy())
            .unwrap();

    let response = client
        .get(&format!("{}/account", server.uri()))
        .await
        .unwrap();
    assert!(response.text().contains("Logout"));
    assert_eq!(client.authenticator().logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_persisted_session_resumes_without_logging_in() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let temp = TempDir::new().unwrap();
    let account_url = format!("{}/account", server.uri());

    // First run: logs in once and flushes the session cookie on drop.
    {
        let client = AuthenticatedClient::with_policy(
            MarkerAuth::new(&server.uri()),
            temp.path(),
            fast_policy(),
        )
        .unwrap();
        client.get(&account_url).await.unwrap();
        assert_eq!(client.authenticator().logins.load(Ordering::SeqCst), 1);
    }

    // Second run with the same credentials: the seeded cookie makes the very
    // first fetch read as logged in, so no login happens at all.
    let client =
        AuthenticatedClient::with_policy(MarkerAuth::new(&server.uri()), temp.path(), fast_policy())
            .unwrap();
    let response = client.get(&account_url).await.unwrap();
    assert!(response.text().contains("Logout"));
    assert_eq!(client.authenticator().logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_credentials_surface_immediately() {
    let server = MockServer::start().await;
    // No cookie-granting login mock: the credential POST is rejected.
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Please sign in"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let client =
        AuthenticatedClient::with_policy(MarkerAuth::new(&server.uri()), temp.path(), fast_policy())
            .unwrap();

    let result = client.get(&format!("{}/account", server.uri())).await;
    assert!(matches!(result, Err(FetchError::InvalidCredentials { .. })));
    assert_eq!(client.authenticator().logins.load(Ordering::SeqCst), 1);
}
