use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    Client, Method, RequestBuilder, Response, StatusCode, Url,
};
use serde::Serialize;
use serde_json::json;

use crate::config::Config;

use super::{errors::ApiErrorBody, AuthSession, CodeVerifier, Error, IdentityProvider, IdentityUser, Result};

/// Client for a GoTrue-compatible auth API (`/auth/v1/...`).
#[derive(Clone)]
pub struct GoTrueClient {
    base_url: Url,
    http: Client,
}

impl GoTrueClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url).map_err(|e| Error::Config(format!("{base_url}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("note-ninja"));
        if !api_key.is_empty() {
            let api_key = HeaderValue::from_str(api_key).map_err(|e| Error::Config(e.to_string()))?;
            headers.insert("apikey", api_key);
        }

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self { base_url, http })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.identity_url, &config.identity_api_key)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<RequestBuilder> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(self.http.request(method, url))
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
        let message = body
            .into_message()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

        tracing::debug!(status = status.as_u16(), %message, "identity provider refused request");

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn token<B: Serialize>(&self, grant_type: &str, body: &B) -> Result<AuthSession> {
        let request = self
            .request(Method::POST, "auth/v1/token", &[("grant_type", grant_type)])?
            .json(body);

        Ok(Self::send(request).await?.json::<AuthSession>().await?)
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str, code_challenge: &str) -> Result<()> {
        let request = self
            .request(Method::POST, "auth/v1/signup", &[("redirect_to", redirect_to)])?
            .json(&json!({
                "email": email,
                "password": password,
                "code_challenge": code_challenge,
                "code_challenge_method": CodeVerifier::METHOD,
            }));

        Self::send(request).await?;
        Ok(())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.token("password", &json!({ "email": email, "password": password }))
            .await
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> Result<Url> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", CodeVerifier::METHOD);
        Ok(url)
    }

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<AuthSession> {
        self.token(
            "pkce",
            &json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let request = self
            .request(Method::POST, "auth/v1/logout", &[])?
            .bearer_auth(access_token);

        Self::send(request).await?;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str, code_challenge: &str) -> Result<()> {
        let request = self
            .request(Method::POST, "auth/v1/recover", &[("redirect_to", redirect_to)])?
            .json(&json!({
                "email": email,
                "code_challenge": code_challenge,
                "code_challenge_method": CodeVerifier::METHOD,
            }));

        Self::send(request).await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, "auth/v1/user", &[])?
            .bearer_auth(access_token)
            .json(&json!({ "password": password }));

        Self::send(request).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<IdentityUser>> {
        let request = self
            .request(Method::GET, "auth/v1/user", &[])?
            .bearer_auth(access_token);

        match Self::send(request).await {
            Ok(response) => Ok(Some(response.json::<IdentityUser>().await?)),
            Err(Error::Api { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::Query,
        http::{HeaderMap as AxumHeaderMap, StatusCode as AxumStatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::Value;
    use tokio::net::TcpListener;
    use uuid::uuid;

    use super::*;

    const ADA: uuid::Uuid = uuid!("018f6146-32f4-7948-8289-cfb5cdb2b2af");

    fn user() -> Value {
        json!({ "id": ADA, "email": "ada@example.com", "aud": "authenticated" })
    }

    async fn token(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> impl IntoResponse {
        let granted = match query.get("grant_type").map(String::as_str) {
            Some("password") => body["email"] == "ada@example.com" && body["password"] == "secret",
            Some("pkce") => body["auth_code"] == "code-1" && body["code_verifier"] == "verifier-1",
            _ => false,
        };

        if granted {
            (
                AxumStatusCode::OK,
                Json(json!({ "access_token": "token-1", "refresh_token": "refresh-1", "token_type": "bearer", "user": user() })),
            )
        } else {
            (
                AxumStatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
            )
        }
    }

    async fn current_user(headers: AxumHeaderMap) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer token-1");

        if authorized {
            (AxumStatusCode::OK, Json(user()))
        } else {
            (
                AxumStatusCode::UNAUTHORIZED,
                Json(json!({ "code": 401, "msg": "invalid JWT" })),
            )
        }
    }

    async fn signup(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> impl IntoResponse {
        if body["email"] == "taken@example.com" {
            return (
                AxumStatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "code": 422, "msg": "User already registered" })),
            );
        }
        assert_eq!(query.get("redirect_to").map(String::as_str), Some("http://app/auth/callback"));
        assert_eq!(body["code_challenge_method"], "plain");
        (AxumStatusCode::OK, Json(user()))
    }

    async fn spawn_identity_api() -> GoTrueClient {
        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(current_user))
            .route("/auth/v1/signup", post(signup))
            .route("/auth/v1/logout", post(|| async { AxumStatusCode::NO_CONTENT }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        GoTrueClient::new(&format!("http://{addr}"), "anon-key").unwrap()
    }

    #[tokio::test]
    async fn password_sign_in() {
        let client = spawn_identity_api().await;

        let session = client.sign_in_with_password("ada@example.com", "secret").await.unwrap();

        assert_eq!(session.access_token, "token-1");
        assert_eq!(session.user.id, ADA);
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn password_sign_in_surfaces_provider_message() {
        let client = spawn_identity_api().await;

        let error = client.sign_in_with_password("ada@example.com", "wrong").await.unwrap_err();

        assert!(matches!(error, Error::Api { status: 400, ref message } if message == "Invalid login credentials"));
    }

    #[tokio::test]
    async fn code_exchange() {
        let client = spawn_identity_api().await;

        let session = client.exchange_code("code-1", "verifier-1").await.unwrap();
        assert_eq!(session.user.id, ADA);

        assert!(client.exchange_code("code-1", "other").await.is_err());
    }

    #[tokio::test]
    async fn get_user_with_stale_token_is_none() {
        let client = spawn_identity_api().await;

        assert_eq!(client.get_user("token-1").await.unwrap().map(|u| u.id), Some(ADA));
        assert_eq!(client.get_user("expired").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_up_and_sign_out() {
        let client = spawn_identity_api().await;

        client
            .sign_up("new@example.com", "secret", "http://app/auth/callback", "challenge")
            .await
            .unwrap();

        let error = client
            .sign_up("taken@example.com", "secret", "http://app/auth/callback", "challenge")
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "User already registered");

        client.sign_out("token-1").await.unwrap();
    }

    #[test]
    fn authorize_url_carries_provider_and_challenge() {
        let client = GoTrueClient::new("https://id.example.com", "").unwrap();

        let url = client
            .authorize_url("google", "https://app.example.com/auth/callback", "abc")
            .unwrap();

        assert_eq!(url.path(), "/auth/v1/authorize");
        let query = url.query_pairs().into_owned().collect::<HashMap<_, _>>();
        assert_eq!(query["provider"], "google");
        assert_eq!(query["redirect_to"], "https://app.example.com/auth/callback");
        assert_eq!(query["code_challenge"], "abc");
        assert_eq!(query["code_challenge_method"], "plain");
    }
}
