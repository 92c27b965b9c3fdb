use std::collections::HashMap;
use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest};
use async_trait::async_trait;
use log::{error, info, warn};

use crate::server::authz::{self, GuestPolicy};
use crate::server::gateway;
use crate::server::proxy::Upstream;
use crate::server::response::{self, Response};
use crate::server::session;

use super::Handler;

/// Headers never copied onto the outbound request: the host is rewritten to
/// the gateway authority, the rest are connection-scoped.
const SKIP_HEADERS: [&str; 3] = ["host", "connection", "content-length"];

/// Proxies dashboard API calls to the gateway after checking that the
/// session claims cover the requested resource.
pub struct ApiHandler {
    guest_policy: GuestPolicy,
    gateway_base: String,
    gateway_authority: String,
    upstream: Arc<dyn Upstream>,
}

impl ApiHandler {
    pub fn new(guest_policy: GuestPolicy, gateway_base: String, upstream: Arc<dyn Upstream>) -> Self {
        let gateway_base = gateway_base.trim_end_matches('/').to_string();
        let gateway_authority = gateway::authority(&gateway_base).to_string();
        Self {
            guest_policy,
            gateway_base,
            gateway_authority,
            upstream,
        }
    }

    fn upstream_url(&self, path: &str, query_string: &str) -> String {
        let proxy_path = path.strip_prefix("/api/").unwrap_or(path);
        let mut url = format!("{}/function/{}", self.gateway_base, proxy_path);
        if !query_string.is_empty() {
            url.push('?');
            url.push_str(query_string);
        }
        url
    }

    fn forward_headers(&self, req: &HttpRequest) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = req
            .headers()
            .iter()
            .filter(|(name, _)| !SKIP_HEADERS.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        headers.push((String::from("host"), self.gateway_authority.clone()));
        headers
    }
}

#[async_trait(?Send)]
impl Handler for ApiHandler {
    async fn handle(&self, path: &str, req: HttpRequest) -> Response {
        let query = parse_query(req.query_string());

        let cookie_header = req
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());
        let claims =
            session::token_from_cookie_header(cookie_header).and_then(session::decode_claims);

        if !authz::is_resource_in_claims(path, &query, claims.as_ref(), self.guest_policy) {
            let sub = claims.map(|c| c.sub).unwrap_or_default();
            warn!("User '{sub}' tried to access a resource they are not entitled to");
            return Response::forbidden();
        }

        let url = self.upstream_url(path, req.query_string());
        let headers = self.forward_headers(&req);

        match self.upstream.forward(&url, &headers).await {
            Ok(resp) => {
                info!("GET {url} - {}", resp.status);
                Response::upstream(resp)
            }
            Err(e) => {
                error!("GET {url} - 500, error: {e:#}");
                Response::error(response::PROXY_ERROR)
            }
        }
    }
}

fn parse_query(query_string: &str) -> HashMap<String, String> {
    web::Query::<HashMap<String, String>>::from_query(query_string)
        .map(|q| q.into_inner())
        .unwrap_or_default()
}
