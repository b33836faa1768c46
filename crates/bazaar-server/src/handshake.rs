//! Upgrade-time request filter: only the live stats path is served.

use std::sync::Arc;

use tokio_tungstenite::tungstenite::handshake::server::{
    Callback, ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::StatusCode;

pub struct PathFilter {
    path: Arc<str>,
}

impl PathFilter {
    pub fn new(path: Arc<str>) -> Self {
        Self { path }
    }
}

impl Callback for PathFilter {
    fn on_request(self, request: &Request, response: Response) -> Result<Response, ErrorResponse> {
        let requested = request.uri().path();
        if requested == &*self.path {
            return Ok(response);
        }
        tracing::debug!(path = requested, "Rejecting upgrade for unknown path");
        let mut rejection = ErrorResponse::new(Some(format!("no live socket at {requested}")));
        *rejection.status_mut() = StatusCode::NOT_FOUND;
        Err(rejection)
    }
}
