use actix_web::HttpRequest;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::server::response::Response;

use super::Handler;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub now: u64,
    pub time_zone: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

pub struct HealthzHandler;

impl HealthzHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Handler for HealthzHandler {
    async fn handle(&self, _path: &str, _req: HttpRequest) -> Response {
        let local = Local::now();
        let offset = format!("{}", local.offset());
        let response = HealthzResponse {
            now: local.timestamp() as u64,
            time_zone: offset,
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        };
        Response::json(response)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[actix_web::test]
    async fn test_healthz_reports_version() {
        let handler = HealthzHandler::new();
        let req = TestRequest::with_uri("/healthz").to_http_request();
        let resp: actix_web::HttpResponse = handler.handle("/healthz", req).await.into();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }
}
