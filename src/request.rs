use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::ClientProvider;
use crate::error::{Error, Result};
use crate::logger::Field;
use crate::options::{with_body, with_context, with_header, RequestOption, RequestOptions};
use crate::response::Reply;

/// Message of the warn event emitted for slow requests
pub const SLOW_LOG: &str = "HTTP_REQUEST_SLOW_LOG";

/// Message of the debug event emitted for every other request
pub const DEBUG_LOG: &str = "HTTP_REQUEST_DEBUG_LOG";

/// Executes requests through the client of a [`ClientProvider`]
///
/// Every invocation sends at most one request and emits exactly one log
/// event once its options have resolved.
///
/// # Examples
///
/// ```no_run
/// use httptool::{with_timeout, CancellationToken, Requester};
/// use std::time::Duration;
///
/// # async fn run() -> httptool::Result<()> {
/// let requester = Requester::global();
/// let reply = requester
///     .get(
///         CancellationToken::new(),
///         "https://httpbin.org/get",
///         [with_timeout(Duration::from_secs(2))],
///     )
///     .await?;
/// println!("{}", reply.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Requester {
    provider: Arc<ClientProvider>,
}

impl Requester {
    pub fn new(provider: Arc<ClientProvider>) -> Self {
        Self { provider }
    }

    /// A requester bound to the process-wide client
    pub fn global() -> Self {
        Self::new(ClientProvider::global())
    }

    pub fn provider(&self) -> &Arc<ClientProvider> {
        &self.provider
    }

    /// Send a request
    ///
    /// Only a 200 OK reply is a success. Any other status is returned as
    /// [`Error::UnexpectedStatus`] carrying the code and the body.
    pub async fn request<I>(&self, method: &str, url: &str, options: I) -> Result<Reply>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let opts = RequestOptions::resolve(options)?;
        let mut log = RequestLog::start(method, url, &opts);
        let result = self.dispatch(method, url, &opts, &mut log).await;
        log.record(&result);
        result
    }

    /// Send a GET request governed by `scope`
    ///
    /// `scope` is applied before `options`, so an explicit
    /// [`with_context`] among them wins.
    pub async fn get<I>(&self, scope: CancellationToken, url: &str, options: I) -> Result<Reply>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let options = std::iter::once(with_context(scope)).chain(options);
        self.request("GET", url, options).await
    }

    /// Send a POST request with `body` governed by `scope`
    ///
    /// `Content-Type: application/json` is set unless `options` overrides it.
    pub async fn post<B, I>(
        &self,
        scope: CancellationToken,
        url: &str,
        body: B,
        options: I,
    ) -> Result<Reply>
    where
        B: Into<Bytes>,
        I: IntoIterator<Item = RequestOption>,
    {
        let defaults = [
            with_header(CONTENT_TYPE, "application/json"),
            with_body(body),
            with_context(scope),
        ];
        self.request("POST", url, defaults.into_iter().chain(options))
            .await
    }

    /// Serialize `payload` as JSON and [`post`](Self::post) it
    pub async fn post_json<T, I>(
        &self,
        scope: CancellationToken,
        url: &str,
        payload: &T,
        options: I,
    ) -> Result<Reply>
    where
        T: serde::Serialize + ?Sized,
        I: IntoIterator<Item = RequestOption>,
    {
        let body = serde_json::to_vec(payload)?;
        self.post(scope, url, body, options).await
    }

    async fn dispatch(
        &self,
        method: &str,
        url: &str,
        opts: &RequestOptions,
        log: &mut RequestLog<'_>,
    ) -> Result<Reply> {
        let request = build_request(method, url, opts)?;
        let deadline = Deadline::new(&opts.scope, opts.timeout);

        let client = self.provider.get();
        let response = deadline.run(client.execute(request)).await;
        log.dispatched();
        let response = response?;

        let status = response.status();
        let body = drain(&deadline, response).await;

        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus { status, body });
        }
        Ok(Reply::new(status, body))
    }
}

impl Default for Requester {
    fn default() -> Self {
        Self::global()
    }
}

/// Send a request through the process-wide client
pub async fn request<I>(method: &str, url: &str, options: I) -> Result<Reply>
where
    I: IntoIterator<Item = RequestOption>,
{
    Requester::global().request(method, url, options).await
}

/// Send a GET request through the process-wide client
pub async fn get<I>(scope: CancellationToken, url: &str, options: I) -> Result<Reply>
where
    I: IntoIterator<Item = RequestOption>,
{
    Requester::global().get(scope, url, options).await
}

/// Send a POST request through the process-wide client
pub async fn post<B, I>(scope: CancellationToken, url: &str, body: B, options: I) -> Result<Reply>
where
    B: Into<Bytes>,
    I: IntoIterator<Item = RequestOption>,
{
    Requester::global().post(scope, url, body, options).await
}

/// Send a JSON POST request through the process-wide client
pub async fn post_json<T, I>(
    scope: CancellationToken,
    url: &str,
    payload: &T,
    options: I,
) -> Result<Reply>
where
    T: serde::Serialize + ?Sized,
    I: IntoIterator<Item = RequestOption>,
{
    Requester::global()
        .post_json(scope, url, payload, options)
        .await
}

fn build_request(method: &str, url: &str, opts: &RequestOptions) -> Result<reqwest::Request> {
    let method =
        Method::from_bytes(method.as_bytes()).map_err(|_| Error::InvalidMethod(method.to_owned()))?;
    let url = Url::parse(url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_request(format!(
            "unsupported URL scheme {:?}",
            url.scheme()
        )));
    }

    let mut request = reqwest::Request::new(method, url);
    let headers = request.headers_mut();
    for (name, value) in &opts.headers {
        headers.append(name.clone(), value.clone());
    }
    if !opts.body.is_empty() {
        *request.body_mut() = Some(opts.body.clone().into());
    }
    Ok(request)
}

/// Bound formed by a cancellation scope and a timeout, whichever fires first
///
/// A timeout too large to represent as an instant never fires.
struct Deadline<'a> {
    scope: &'a CancellationToken,
    at: Option<Instant>,
    timeout: Duration,
}

impl<'a> Deadline<'a> {
    fn new(scope: &'a CancellationToken, timeout: Duration) -> Self {
        Self {
            scope,
            at: Instant::now().checked_add(timeout),
            timeout,
        }
    }

    async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = reqwest::Result<T>>,
    {
        let bounded = async {
            match self.at {
                Some(at) => match tokio::time::timeout_at(at, fut).await {
                    Ok(result) => result.map_err(Error::Network),
                    Err(_) => Err(Error::timeout(self.timeout)),
                },
                None => fut.await.map_err(Error::Network),
            }
        };

        tokio::select! {
            biased;
            _ = self.scope.cancelled() => Err(Error::Cancelled),
            outcome = bounded => outcome,
        }
    }
}

/// Read the body until it ends, the deadline fires or the connection fails.
///
/// Failures are not reported; whatever arrived before them is returned.
async fn drain(deadline: &Deadline<'_>, mut response: reqwest::Response) -> Bytes {
    let mut body = BytesMut::new();
    loop {
        match deadline.run(response.chunk()).await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(
                    target: "httptool",
                    error = %err,
                    received = body.len(),
                    "response body truncated"
                );
                break;
            }
        }
    }
    body.freeze()
}

struct Outcome {
    reply: Bytes,
    error: Option<String>,
}

/// Emits the request log event when dropped
///
/// Dropping without a recorded outcome means the caller abandoned the
/// request mid-flight; that is logged as an error of its own.
struct RequestLog<'a> {
    method: &'a str,
    url: &'a str,
    opts: &'a RequestOptions,
    start: Instant,
    elapsed: Option<Duration>,
    outcome: Option<Outcome>,
}

impl<'a> RequestLog<'a> {
    fn start(method: &'a str, url: &'a str, opts: &'a RequestOptions) -> Self {
        Self {
            method,
            url,
            opts,
            start: Instant::now(),
            elapsed: None,
            outcome: None,
        }
    }

    /// Stop the clock once the dispatch has returned
    fn dispatched(&mut self) {
        self.elapsed.get_or_insert_with(|| self.start.elapsed());
    }

    fn record(&mut self, result: &Result<Reply>) {
        let outcome = match result {
            Ok(reply) => Outcome {
                reply: reply.body().clone(),
                error: None,
            },
            Err(err) => Outcome {
                reply: err.body().cloned().unwrap_or_default(),
                error: Some(err.to_string()),
            },
        };
        self.outcome = Some(outcome);
    }

    fn fields(&self, elapsed: Duration, outcome: &Outcome) -> [Field; 6] {
        [
            ("method", self.method.to_owned()),
            ("url", self.url.to_owned()),
            ("body", String::from_utf8_lossy(&self.opts.body).into_owned()),
            ("reply", String::from_utf8_lossy(&outcome.reply).into_owned()),
            ("err", outcome.error.clone().unwrap_or_default()),
            ("dur_ms", format!("{:.3}", elapsed.as_secs_f64() * 1000.0)),
        ]
    }
}

impl Drop for RequestLog<'_> {
    fn drop(&mut self) {
        let elapsed = self.elapsed.unwrap_or_else(|| self.start.elapsed());
        let outcome = self.outcome.take().unwrap_or_else(|| Outcome {
            reply: Bytes::new(),
            error: Some("request dropped before completion".to_owned()),
        });
        let fields = self.fields(elapsed, &outcome);

        let logger = &self.opts.logger;
        if self.opts.is_slow(elapsed) {
            logger.warn(&self.opts.scope, SLOW_LOG, &fields);
        } else {
            logger.debug(&self.opts.scope, DEBUG_LOG, &fields);
        }
    }
}
