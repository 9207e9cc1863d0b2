use std::borrow::Cow;

use bytes::Bytes;
use http::StatusCode;

use crate::error::Result;

/// A successful (200 OK) reply with its fully drained body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: StatusCode,
    body: Bytes,
}

impl Reply {
    pub(crate) fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Take the response body
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Split into status code and body
    pub fn into_parts(self) -> (StatusCode, Bytes) {
        (self.status, self.body)
    }

    /// The body as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the body as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Status {
        status: String,
    }

    #[test]
    fn test_reply_accessors() {
        let reply = Reply::new(StatusCode::OK, Bytes::from_static(br#"{"status":"ok"}"#));
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.text(), r#"{"status":"ok"}"#);
        assert_eq!(
            reply.json::<Status>().unwrap(),
            Status {
                status: "ok".into()
            }
        );

        let (status, body) = reply.into_parts();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.len(), 15);
    }

    #[test]
    fn test_reply_json_error() {
        let reply = Reply::new(StatusCode::OK, Bytes::from_static(b"not json"));
        assert!(reply.json::<Status>().is_err());
    }
}
