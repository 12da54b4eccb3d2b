use std::collections::BTreeMap;

use bytes::Bytes;

/// One observed request, handed to the recorder after the proxy finished
/// forwarding it upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub body: Bytes,
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// The body as text. Matching treats bodies as strings, so non-UTF-8
    /// payloads degrade to their lossy decoding; this keeps recorded patterns
    /// compatible with text-based matching at the cost of precision for
    /// binary bodies.
    pub fn body_as_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The upstream's answer for one exchange, with the flags the recorder needs
/// to decide whether and how to persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    /// Set when the response was produced by forwarding to a real upstream.
    /// Locally served responses are never recorded.
    pub from_proxy: bool,
    /// Set when the body bytes are gzip-compressed as received.
    pub gzip_encoded: bool,
}
