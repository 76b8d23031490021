use std::sync::OnceLock;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub json_logs: bool,

    /// Public origin used when the request carries no `Origin` header.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    // identity provider
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    #[serde(default)]
    pub identity_api_key: String,
    #[serde(default = "default_oauth_provider")]
    pub oauth_provider: String,
    /// Where the provider sends the browser after an OAuth sign-in.
    /// Defaults to `{origin}/auth/callback?redirect_to=/notes`.
    pub oauth_redirect_url: Option<String>,

    // build
    #[serde(default = "default_local")]
    pub source: String,
    #[serde(default = "default_local")]
    pub git_commit: String,
    #[serde(default = "default_local")]
    pub pipeline_id: String,
    #[serde(default = "default_local")]
    pub version: String,
}

fn default_port() -> u16 {
    4000
}

fn default_database_url() -> String {
    "sqlite.db".into()
}

fn default_site_url() -> String {
    "http://127.0.0.1:4000".into()
}

fn default_identity_url() -> String {
    "http://127.0.0.1:54321".into()
}

fn default_oauth_provider() -> String {
    "google".into()
}

fn default_local() -> String {
    "local".into()
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        envy::from_env::<Self>().unwrap_or_else(|err| panic!("invalid configuration: {err}"))
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[cfg(test)]
pub fn config_override<F>(override_config: F) -> &'static Config
where
    F: FnOnce(Config) -> Config,
{
    CONFIG.get_or_init(|| override_config(Config::from_env()))
}
