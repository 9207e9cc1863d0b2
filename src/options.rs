use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_TIMEOUT;
use crate::error::Result;
use crate::logger::{default_logger, Logger};

/// Resolved settings for a single request
///
/// Built fresh for every invocation from the defaults and the caller's
/// options, then read-only for the rest of the request.
#[derive(Clone)]
pub struct RequestOptions {
    /// Scope whose cancellation aborts the request
    pub scope: CancellationToken,
    /// Bound on the request, combined with `scope`
    pub timeout: Duration,
    /// Request body
    pub body: Bytes,
    /// Headers to add to the request
    pub headers: HeaderMap,
    /// Where the request log goes
    pub logger: Arc<dyn Logger>,
    /// Requests at least this slow are logged at warn level. `None` or zero disables it.
    pub slow_threshold: Option<Duration>,
}

impl RequestOptions {
    /// Apply `options` in order on top of the defaults
    ///
    /// Stops at the first option that fails.
    pub fn resolve<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let mut resolved = Self::default();
        for option in options {
            option.apply(&mut resolved)?;
        }
        Ok(resolved)
    }

    /// Whether a request that took `elapsed` counts as slow
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        match self.slow_threshold {
            Some(threshold) => !threshold.is_zero() && elapsed >= threshold,
            None => false,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            scope: CancellationToken::new(),
            timeout: DEFAULT_TIMEOUT,
            body: Bytes::new(),
            headers: HeaderMap::new(),
            logger: default_logger(),
            slow_threshold: None,
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("cancelled", &self.scope.is_cancelled())
            .field("timeout", &self.timeout)
            .field("body", &format_args!("{} bytes", self.body.len()))
            .field("headers", &self.headers)
            .field("slow_threshold", &self.slow_threshold)
            .finish()
    }
}

/// A single transformation of [`RequestOptions`]
///
/// Scalar settings are last-writer-wins; headers overlay what earlier
/// options set.
pub struct RequestOption(Box<dyn FnOnce(&mut RequestOptions) -> Result<()> + Send>);

impl RequestOption {
    /// Wrap a custom transformation. Returning an error aborts the request
    /// before anything is sent.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestOptions) -> Result<()> + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub fn apply(self, options: &mut RequestOptions) -> Result<()> {
        (self.0)(options)
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestOption")
    }
}

/// Govern the request by `scope`
pub fn with_context(scope: CancellationToken) -> RequestOption {
    RequestOption::new(move |opts| {
        opts.scope = scope;
        Ok(())
    })
}

pub fn with_timeout(timeout: Duration) -> RequestOption {
    RequestOption::new(move |opts| {
        opts.timeout = timeout;
        Ok(())
    })
}

pub fn with_body(body: impl Into<Bytes>) -> RequestOption {
    let body = body.into();
    RequestOption::new(move |opts| {
        opts.body = body;
        Ok(())
    })
}

/// Overlay `headers` onto the headers set so far
///
/// Names and values are validated when the option is applied; an invalid one
/// fails the request with [`Error::InvalidOption`](crate::Error::InvalidOption).
pub fn with_headers<I, K, V>(headers: I) -> RequestOption
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let headers: Vec<(String, String)> = headers
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
        .collect();

    RequestOption::new(move |opts| {
        for (name, value) in headers {
            let name = name.parse::<HeaderName>()?;
            let value = value.parse::<HeaderValue>()?;
            opts.headers.insert(name, value);
        }
        Ok(())
    })
}

pub fn with_header(name: impl AsRef<str>, value: impl AsRef<str>) -> RequestOption {
    with_headers([(name, value)])
}

pub fn with_logger(logger: Arc<dyn Logger>) -> RequestOption {
    RequestOption::new(move |opts| {
        opts.logger = logger;
        Ok(())
    })
}

/// Log requests taking at least `threshold` at warn level
pub fn with_slow_threshold(threshold: Duration) -> RequestOption {
    RequestOption::new(move |opts| {
        opts.slow_threshold = Some(threshold);
        Ok(())
    })
}
