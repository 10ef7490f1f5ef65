use reqwest::blocking::Request;

use crate::error::Result;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a prepared GET request and hands back the raw reply.
///
/// Implementations only report transport failures as errors; non-2xx
/// statuses are returned as replies and judged by the caller.
pub trait HttpClient: Send + Sync {
    fn execute(&self, req: Request) -> Result<HttpReply>;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn execute(&self, req: Request) -> Result<HttpReply> {
        (**self).execute(req)
    }
}
