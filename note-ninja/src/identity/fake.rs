//! In-process identity provider for tests. Knows a single account.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;
use uuid::{uuid, Uuid};

use super::{AuthSession, Error, IdentityProvider, IdentityUser, Result};

pub const ADA_ID: Uuid = uuid!("018f6146-32f4-7948-8289-cfb5cdb2b2af");
pub const ADA_EMAIL: &str = "ada@example.com";
pub const ADA_PASSWORD: &str = "secret";
pub const ADA_TOKEN: &str = "token-ada";
pub const ADA_CODE: &str = "code-ada";

pub struct FakeIdentity {
    password: Mutex<String>,
    challenge: Mutex<Option<String>>,
    signed_out: Mutex<Vec<String>>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            password: Mutex::new(ADA_PASSWORD.into()),
            challenge: Mutex::new(None),
            signed_out: Mutex::new(vec![]),
        }
    }
}

impl FakeIdentity {
    pub fn password(&self) -> String {
        self.password.lock().unwrap().clone()
    }

    pub fn last_challenge(&self) -> Option<String> {
        self.challenge.lock().unwrap().clone()
    }

    pub fn signed_out(&self) -> Vec<String> {
        self.signed_out.lock().unwrap().clone()
    }

    fn remember_challenge(&self, code_challenge: &str) {
        *self.challenge.lock().unwrap() = Some(code_challenge.to_string());
    }

    fn session() -> AuthSession {
        AuthSession {
            access_token: ADA_TOKEN.into(),
            refresh_token: Some("refresh-ada".into()),
            user: IdentityUser {
                id: ADA_ID,
                email: Some(ADA_EMAIL.into()),
            },
        }
    }
}

fn api_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: message.into(),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, email: &str, _password: &str, _redirect_to: &str, code_challenge: &str) -> Result<()> {
        if email == ADA_EMAIL {
            return Err(api_error(422, "User already registered"));
        }
        self.remember_challenge(code_challenge);
        Ok(())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        if email == ADA_EMAIL && password == self.password() {
            return Ok(Self::session());
        }
        Err(api_error(400, "Invalid login credentials"))
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> Result<Url> {
        if provider != "google" {
            return Err(api_error(400, "Unsupported provider: provider is not enabled"));
        }
        self.remember_challenge(code_challenge);

        Url::parse_with_params(
            "https://identity.test/authorize",
            [("provider", provider), ("redirect_to", redirect_to)],
        )
        .map_err(|e| Error::Config(e.to_string()))
    }

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<AuthSession> {
        if auth_code == ADA_CODE && self.last_challenge().as_deref() == Some(code_verifier) {
            return Ok(Self::session());
        }
        Err(api_error(403, "invalid flow state, no valid flow state found"))
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, _redirect_to: &str, code_challenge: &str) -> Result<()> {
        if email != ADA_EMAIL {
            return Err(api_error(400, "User not found"));
        }
        self.remember_challenge(code_challenge);
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()> {
        if access_token != ADA_TOKEN {
            return Err(api_error(401, "invalid JWT"));
        }
        if password.len() < 6 {
            return Err(api_error(422, "Password should be at least 6 characters."));
        }
        *self.password.lock().unwrap() = password.to_string();
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<IdentityUser>> {
        Ok((access_token == ADA_TOKEN).then(|| Self::session().user))
    }
}
