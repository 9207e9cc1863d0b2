use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use http::{HeaderMap, HeaderName, HeaderValue};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{Client as ReqwestClient, ClientBuilder as ReqwestBuilder};

use crate::config::PoolConfig;
use crate::error::Result;

/// Pooled HTTP client handle
///
/// Cloning is cheap: every clone shares the same connection pool. Two handles
/// are the same client when [`Client::ptr_eq`] says so.
///
/// # Examples
///
/// ```rust
/// use httptool::Client;
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .connect_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok::<(), httptool::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ReqwestClient>,
}

impl Client {
    /// Create a new client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &ReqwestClient {
        &self.inner
    }

    /// Whether both handles share one underlying client
    pub fn ptr_eq(&self, other: &Client) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn execute(
        &self,
        request: reqwest::Request,
    ) -> reqwest::Result<reqwest::Response> {
        self.inner.execute(request).await
    }
}

impl From<ReqwestClient> for Client {
    fn from(client: ReqwestClient) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }
}

/// Builder for creating HTTP clients with custom configuration
///
/// # Examples
///
/// ```rust
/// use httptool::ClientBuilder;
/// use std::time::Duration;
///
/// let client = ClientBuilder::new()
///     .pool_idle_timeout(Duration::from_secs(30))
///     .user_agent("MyApp/1.0")?
///     .build()?;
/// # Ok::<(), httptool::Error>(())
/// ```
pub struct ClientBuilder {
    reqwest_builder: ReqwestBuilder,
    pool_config: PoolConfig,
    default_headers: HeaderMap,
}

impl ClientBuilder {
    /// Create a new client builder with the fixed pool defaults
    pub fn new() -> Self {
        Self {
            reqwest_builder: ReqwestClient::builder(),
            pool_config: PoolConfig::default(),
            default_headers: HeaderMap::new(),
        }
    }

    /// Replace the pool configuration
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set a hard timeout applied to every request sent through this client
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.reqwest_builder = self.reqwest_builder.timeout(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config = self.pool_config.connect_timeout(timeout);
        self
    }

    /// Set the pool idle timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config = self.pool_config.pool_idle_timeout(timeout);
        self
    }

    /// Set the maximum number of idle connections kept per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_config = self.pool_config.pool_max_idle_per_host(max);
        self
    }

    /// Set a default header for all requests
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name.parse::<HeaderName>()?;
        let value = value.parse::<HeaderValue>()?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Set the user agent
    pub fn user_agent(self, user_agent: &str) -> Result<Self> {
        self.default_header("User-Agent", user_agent)
    }

    /// Build the client
    pub fn build(self) -> Result<Client> {
        let reqwest_client = self
            .pool_config
            .apply_to_builder(self.reqwest_builder)
            .default_headers(self.default_headers)
            .build()?;

        Ok(Client::from(reqwest_client))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Lazy<Arc<ClientProvider>> = Lazy::new(|| Arc::new(ClientProvider::new()));

/// Source of the client every request is dispatched through
///
/// The pooled client is built at most once, on the first [`get`](Self::get)
/// that finds no override. An override installed with [`set`](Self::set)
/// takes precedence from then on, whether or not the pooled client exists.
pub struct ClientProvider {
    overridden: ArcSwapOption<Client>,
    pooled: OnceCell<Client>,
    config: PoolConfig,
}

impl ClientProvider {
    /// Create a provider that lazily builds a client with the fixed pool defaults
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a provider that lazily builds a client from `config`
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            overridden: ArcSwapOption::empty(),
            pooled: OnceCell::new(),
            config,
        }
    }

    /// The process-wide provider
    pub fn global() -> Arc<ClientProvider> {
        GLOBAL.clone()
    }

    /// Get the current client
    pub fn get(&self) -> Client {
        if let Some(client) = self.overridden.load_full() {
            return Client::clone(&client);
        }

        self.pooled
            .get_or_init(|| {
                tracing::debug!(target: "httptool", config = ?self.config, "building shared HTTP client");
                // Only fails when the TLS backend cannot initialise.
                ClientBuilder::new()
                    .pool_config(self.config.clone())
                    .build()
                    .expect("Failed to build shared HTTP client")
            })
            .clone()
    }

    /// Replace the client for all subsequent [`get`](Self::get) calls
    ///
    /// Requests already in flight keep the client they started with.
    pub fn set(&self, client: Client) {
        self.overridden.store(Some(Arc::new(client)));
    }
}

impl Default for ClientProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the process-wide HTTP client
pub fn http_client() -> Client {
    GLOBAL.get()
}

/// Replace the process-wide HTTP client
pub fn set_http_client(client: Client) {
    GLOBAL.set(client)
}
