//! GraphQL client over reqwest

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;
use waypoint_config::Config;
use waypoint_errors::{Error, NetworkError};

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl NetConfig {
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not a valid URL.
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| NetworkError::InvalidUrl(format!("{endpoint}: {e}")))?;
        Ok(Self {
            endpoint,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("waypoint/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Build from the `network` section of the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a valid URL.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut net = Self::new(&config.network.endpoint)?;
        net.timeout = Duration::from_secs(config.network.timeout);
        net.connect_timeout = Duration::from_secs(config.network.connect_timeout);
        Ok(net)
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Authenticated GraphQL client bound to one account
#[derive(Clone)]
pub struct GraphQlClient {
    client: Client,
    config: NetConfig,
    api_key: String,
    account_id: u64,
}

impl GraphQlClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(
        config: NetConfig,
        api_key: impl Into<String>,
        account_id: u64,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
            account_id,
        })
    }

    /// Create a client from configuration, requiring credentials
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when the API key or account id is
    /// absent, or a network error if the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let (api_key, account_id) = config.credentials()?;
        Self::new(NetConfig::from_config(config)?, api_key, account_id)
    }

    #[must_use]
    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    /// Execute one GraphQL operation and decode its `data` member
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` for transport failures, non-success HTTP
    /// statuses, GraphQL errors and undecodable payloads.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<T, Error> {
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header("API-Key", &self.api_key)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            return Err(NetworkError::RateLimited { seconds }.into());
        }
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into());
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;

        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(NetworkError::GraphQl(messages.join("; ")).into());
        }

        body.data
            .ok_or_else(|| NetworkError::InvalidResponse("response carried no data".into()).into())
    }

    fn transport_error(&self, error: &reqwest::Error) -> Error {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: self.config.endpoint.to_string(),
            }
            .into()
        } else {
            NetworkError::ConnectionRefused(error.to_string()).into()
        }
    }
}
