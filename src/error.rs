use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing required credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("{service} API returned HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} query failed: {message}")]
    Query {
        service: &'static str,
        message: String,
    },

    #[error("unexpected {service} response: {detail}")]
    Shape {
        service: &'static str,
        detail: String,
    },

    #[error("cannot produce report: {0}")]
    Render(String),
}

impl ReportError {
    pub fn shape(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Shape {
            service,
            detail: detail.into(),
        }
    }
}

/// Trim a response body down to something that fits in a log line.
pub fn body_excerpt(body: &str) -> String {
    body.chars().take(300).collect()
}
