use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::env::{get_env_var, get_optional_env_var};
use snafu::ResultExt;

use crate::providers::{
    CredentialsFileSnafu, CredentialsFormatSnafu, MissingEnvVarSnafu, ProviderInitError,
};

pub const API_KEY_VAR: &str = "BYBIT_API_KEY";

/// API key for the exchange.
///
/// Market-data endpoints are public and unsigned, so only the key is kept and
/// credentials are optional everywhere. When present, the key is attached to
/// each request.
#[derive(Debug)]
pub struct BybitCredentials {
    api_key: SecretString,
}

/// On-disk layout of a credentials file. Other keys, such as
/// `bybitAPISecret`, are ignored.
#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(rename = "bybitAPI")]
    api_key: String,
}

impl BybitCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        Self {
            api_key: SecretString::new(api_key.into_boxed_str()),
        }
    }

    /// Reads `BYBIT_API_KEY`.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let api_key = get_env_var(API_KEY_VAR).context(MissingEnvVarSnafu)?;
        Ok(Self::new(api_key))
    }

    /// Reads a JSON file of the form `{"bybitAPI": "...", "bybitAPISecret": "..."}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProviderInitError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).context(CredentialsFileSnafu { path })?;
        let parsed: CredentialsFile =
            serde_json::from_str(&raw).context(CredentialsFormatSnafu { path })?;
        Ok(Self::new(parsed.api_key))
    }

    /// Loads credentials from `path` when given, otherwise from the environment
    /// if `BYBIT_API_KEY` is set. Returns `None` when neither source exists.
    pub fn discover(path: Option<&Path>) -> Result<Option<Self>, ProviderInitError> {
        match path {
            Some(path) => Self::from_file(path).map(Some),
            None if get_optional_env_var(API_KEY_VAR).is_some() => Self::from_env().map(Some),
            None => Ok(None),
        }
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }
}
