use std::time::Duration;

/// Default bound on a single request, dispatch and body drain included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection pool settings for the shared client
///
/// The defaults are the fixed parameters the process-wide client is built with.
/// TLS goes through rustls, which offers `h2` and `http/1.1` over ALPN, so
/// HTTP/2 is attempted with every HTTPS server.
///
/// hyper's pool has no knob for a total idle limit (100) or for connections
/// per host (50), and the TLS handshake (10s) is bounded only by the connect
/// timeout. Those parts of the pool are left at hyper's behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// TCP keep-alive interval
    pub tcp_keepalive: Duration,
    /// How long an idle pooled connection is kept
    pub pool_idle_timeout: Duration,
    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
    /// User agent sent on every request
    pub user_agent: Option<String>,
}

impl PoolConfig {
    /// Create a pool configuration with the fixed defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the TCP keep-alive interval
    pub fn tcp_keepalive(mut self, interval: Duration) -> Self {
        self.tcp_keepalive = interval;
        self
    }

    /// Set the pool idle timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set how many idle connections are kept per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Apply these settings to a reqwest builder
    pub(crate) fn apply_to_builder(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let builder = builder
            .use_rustls_tls()
            .connect_timeout(self.connect_timeout)
            .tcp_keepalive(self.tcp_keepalive)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        match &self.user_agent {
            Some(user_agent) => builder.user_agent(user_agent.as_str()),
            None => builder,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 50,
            user_agent: None,
        }
    }
}
