use std::path::{Path, PathBuf};

use actix_web::http::header;
use actix_web::HttpRequest;
use async_trait::async_trait;
use log::error;
use tokio::fs;

use crate::config::EdgeConfig;
use crate::server::response::{self, Response};
use crate::server::session::{self, SessionClaims};

use super::Handler;

/// Path of the SPA shell inside the assets directory.
const SPA_ENTRY: &str = "dist/index.html";

/// Serves the built SPA: hashed asset files by extension, everything else
/// gets the HTML shell with its placeholders substituted.
pub struct AssetsHandler {
    assets_dir: PathBuf,
    base_href: String,
    public_url: String,
    pretty_url: String,
    query_pretty_url: bool,
}

impl AssetsHandler {
    pub fn new(cfg: &EdgeConfig) -> Self {
        Self {
            assets_dir: PathBuf::from(&cfg.assets_dir),
            base_href: cfg.base_href.clone(),
            public_url: cfg.public_url.clone(),
            pretty_url: cfg.pretty_url.clone(),
            query_pretty_url: cfg.query_pretty_url,
        }
    }

    async fn serve_file(&self, path: &str, content_type: &'static str) -> Response {
        let file = self.assets_dir.join(sanitize(path));
        match fs::read(&file).await {
            Ok(data) => Response::asset(content_type, data),
            Err(e) => {
                error!("Failed to read asset '{}': {e}", file.display());
                Response::error(response::ASSET_ERROR)
            }
        }
    }

    async fn serve_shell(&self, path: &str, req: &HttpRequest) -> Response {
        let cookie_header = req
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());
        let signed_in = session::is_signed_in(cookie_header);
        let claims =
            session::token_from_cookie_header(cookie_header).and_then(session::decode_claims);

        if path == "/" && signed_in {
            // A decodable session lands on the subject's dashboard; a
            // cookie that does not decode to a subject has nowhere to go.
            return match claims {
                Some(claims) if !claims.sub.is_empty() => {
                    Response::redirect(&format!("/dashboard/{}", claims.sub))
                }
                _ => Response::not_found(),
            };
        }

        let entry = self.assets_dir.join(SPA_ENTRY);
        let content = match fs::read_to_string(&entry).await {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read SPA entry '{}': {e}", entry.display());
                return Response::error(response::ASSET_ERROR);
            }
        };

        Response::html(self.render_shell(content, signed_in, claims.as_ref()))
    }

    fn render_shell(
        &self,
        content: String,
        signed_in: bool,
        claims: Option<&SessionClaims>,
    ) -> String {
        let all_claims = claims.map(|c| c.all_claims()).unwrap_or_default();
        let organizations = session::organizations(claims);

        content
            .replace("__BASE_HREF__", &self.base_href)
            .replace("__PUBLIC_URL__", &self.public_url)
            .replace("__PRETTY_URL__", &self.pretty_url)
            .replace("__QUERY_PRETTY_URL__", bool_str(self.query_pretty_url))
            .replace("__IS_SIGNED_IN__", bool_str(signed_in))
            .replace("__ALL_CLAIMS__", &all_claims)
            .replace("__ORGANIZATIONS__", organizations)
    }
}

#[async_trait(?Send)]
impl Handler for AssetsHandler {
    async fn handle(&self, path: &str, req: HttpRequest) -> Response {
        match content_type_for(path) {
            Some(content_type) => self.serve_file(path, content_type).await,
            None => self.serve_shell(path, &req).await,
        }
    }
}

/// Content type by extension; `None` means the path is not an asset and
/// resolves to the SPA shell.
fn content_type_for(path: &str) -> Option<&'static str> {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("js") => Some("application/javascript"),
        Some("css") => Some("text/css"),
        Some("ico") => Some("image/x-icon"),
        Some("json") => Some("application/json"),
        Some("map") => Some("application/octet-stream"),
        _ => None,
    }
}

// Keeps resolved paths inside the assets directory: relative, no parent
// segments.
fn sanitize(path: &str) -> String {
    path.trim_start_matches('/')
        .replace("..", "")
        .trim_start_matches('/')
        .to_string()
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
