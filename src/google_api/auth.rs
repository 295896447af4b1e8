//! OAuth2 browser consent flow for Google sign-in.
//!
//! Opens the user's browser for consent, captures the redirect on a
//! localhost listener, exchanges the auth code for tokens, and fetches the
//! user's profile.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::{load_credentials, GoogleApiError, GoogleToken, TokenStore, SCOPES};

/// How long to wait for the browser redirect.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// The signed-in Google account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleAccount {
    pub name: String,
    pub email: String,
}

/// Run the full OAuth2 consent flow and persist the token.
pub async fn run_consent_flow(
    credentials_path: &Path,
    tokens: &TokenStore,
) -> Result<GoogleAccount, GoogleApiError> {
    let creds = load_credentials(credentials_path)?;
    let installed = &creds.installed;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://localhost:{}", port);

    let auth_url = build_auth_url(&installed.auth_uri, &installed.client_id, &redirect_uri);

    log::info!("Opening browser for Google OAuth consent...");
    if let Err(e) = open::that(&auth_url) {
        log::warn!("Failed to open browser: {}. URL: {}", e, auth_url);
    }

    let auth_code = tokio::time::timeout(CONSENT_TIMEOUT, wait_for_auth_code(&listener))
        .await
        .map_err(|_| GoogleApiError::FlowCancelled)??;

    let mut form = vec![
        ("code", auth_code.as_str()),
        ("client_id", installed.client_id.as_str()),
        ("redirect_uri", redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];
    if let Some(secret) = installed.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let client = reqwest::Client::new();
    let resp = client.post(&installed.token_uri).form(&form).send().await?;
    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GoogleApiError::RefreshFailed(format!(
            "Token exchange failed: {}",
            body
        )));
    }

    let body: serde_json::Value = resp.json().await?;
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| GoogleApiError::RefreshFailed("No access_token in response".into()))?
        .to_string();
    let refresh_token = body["refresh_token"].as_str().map(|s| s.to_string());
    let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
    let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64);

    let account = fetch_account(&access_token).await;

    let token = GoogleToken {
        token: access_token,
        refresh_token,
        token_uri: installed.token_uri.clone(),
        client_id: installed.client_id.clone(),
        client_secret: installed.client_secret.clone(),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        expiry: Some(expiry.to_rfc3339()),
        account: Some(account.email.clone()),
    };
    tokens.save(&token)?;

    log::info!("Signed in to Google as {}", account.email);
    Ok(account)
}

fn build_auth_url(auth_uri: &str, client_id: &str, redirect_uri: &str) -> String {
    let scope_string = SCOPES.join(" ");
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        auth_uri,
        urlencoding(client_id),
        urlencoding(redirect_uri),
        urlencoding(&scope_string),
    )
}

/// Wait for the OAuth redirect and extract the auth code from the URL.
async fn wait_for_auth_code(listener: &TcpListener) -> Result<String, GoogleApiError> {
    let (mut stream, _) = listener.accept().await?;

    let mut buffer = [0u8; 4096];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]).to_string();

    let result = parse_auth_code(&request);
    let message = match &result {
        Ok(_) => "Sign-in successful! You can close this tab and return to Noteflow.",
        Err(_) if request.contains("error=") => "Authorization denied. You can close this tab.",
        Err(_) => "No authorization code received. You can close this tab.",
    };
    send_response(&mut stream, message).await;
    result
}

/// Pull `code` out of the request line `GET /?code=xxx&scope=... HTTP/1.1`.
fn parse_auth_code(request: &str) -> Result<String, GoogleApiError> {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or(GoogleApiError::FlowCancelled)?;
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or(GoogleApiError::FlowCancelled)
}

async fn send_response(stream: &mut tokio::net::TcpStream, message: &str) {
    let body = format!(
        "<html><body style=\"font-family: system-ui; text-align: center; padding: 40px;\">\
         <h2>{}</h2></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.flush().await;
}

/// Fetch name and email from the userinfo endpoint.
///
/// Falls back to placeholder values if the call fails.
async fn fetch_account(access_token: &str) -> GoogleAccount {
    let client = reqwest::Client::new();
    let mut account = GoogleAccount {
        name: "Google User".to_string(),
        email: "authenticated".to_string(),
    };

    match client
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .bearer_auth(access_token)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            if let Ok(body) = resp.json::<serde_json::Value>().await {
                if let Some(email) = body["email"].as_str() {
                    account.email = email.to_string();
                }
                if let Some(name) = body["name"].as_str() {
                    account.name = name.to_string();
                }
            }
        }
        Ok(resp) => log::warn!("userinfo returned {}", resp.status()),
        Err(e) => log::warn!("userinfo request failed: {}", e),
    }
    account
}

fn urlencoding(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
