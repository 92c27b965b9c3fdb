use std::path::PathBuf;

use actix_web::HttpRequest;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use log::error;
use tokio::fs;

use crate::server::response::{self, Response};
use crate::server::session::SESSION_COOKIE;

use super::Handler;

/// Path of the logout page inside the assets directory.
const LOGOUT_PAGE: &str = "dist/logout.html";

/// Clears the session cookie and shows the logout page.
pub struct LogoutHandler {
    cookie_root_domain: String,
    assets_dir: PathBuf,
}

impl LogoutHandler {
    pub fn new(cookie_root_domain: String, assets_dir: PathBuf) -> Self {
        Self {
            cookie_root_domain,
            assets_dir,
        }
    }
}

#[async_trait(?Send)]
impl Handler for LogoutHandler {
    async fn handle(&self, _path: &str, _req: HttpRequest) -> Response {
        let page = self.assets_dir.join(LOGOUT_PAGE);
        let content = match fs::read_to_string(&page).await {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read logout page '{}': {e}", page.display());
                return Response::error(response::ASSET_ERROR);
            }
        };

        let cookie = clearing_cookie(&self.cookie_root_domain, Local::now());
        Response::html(content).append_header("Set-Cookie", &cookie)
    }
}

/// A `Set-Cookie` value that clears the session cookie: empty value,
/// expiry at the current day's local midnight, scoped to the root domain.
fn clearing_cookie(domain: &str, now: DateTime<Local>) -> String {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or_else(|| now.with_timezone(&Local));
    let expires = midnight
        .with_timezone(&Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT");

    format!("{SESSION_COOKIE}=; Expires={expires}; Domain={domain}; Path=/")
}

#[cfg(test)]
mod tests {
    use std::fs as std_fs;

    use actix_web::test::TestRequest;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_clearing_cookie_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 15, 17, 30, 9).unwrap();
        let cookie = clearing_cookie("o6s.io", now);

        assert!(cookie.starts_with("openfaas_cloud_token=;"));
        assert!(cookie.contains("Domain=o6s.io"));
        assert!(cookie.ends_with("Path=/"));
        // Expiry is the day's midnight, so it always lies in the past.
        assert!(cookie.contains("Expires="));
        assert!(cookie.contains("GMT"));
    }

    #[actix_web::test]
    async fn test_logout_serves_page_and_clears_cookie() {
        let dir = std::env::temp_dir().join(format!("faasdash-logout-{}", std::process::id()));
        std_fs::create_dir_all(dir.join("dist")).unwrap();
        std_fs::write(dir.join(LOGOUT_PAGE), "<html>signed out</html>").unwrap();

        let handler = LogoutHandler::new(String::from("o6s.io"), dir);
        let req = TestRequest::with_uri("/logout").to_http_request();
        let resp: actix_web::HttpResponse = handler.handle("/logout", req).await.into();

        assert_eq!(resp.status().as_u16(), 200);
        let cookie = resp.headers().get("Set-Cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with("openfaas_cloud_token=;"));
        assert!(cookie.contains("Domain=o6s.io"));
    }

    #[actix_web::test]
    async fn test_logout_missing_page_is_500() {
        let dir = std::env::temp_dir().join(format!("faasdash-logout-missing-{}", std::process::id()));
        std_fs::create_dir_all(&dir).unwrap();

        let handler = LogoutHandler::new(String::from("o6s.io"), dir);
        let req = TestRequest::with_uri("/logout").to_http_request();
        let resp: actix_web::HttpResponse = handler.handle("/logout", req).await.into();
        assert_eq!(resp.status().as_u16(), 500);
    }
}
