pub mod api;
pub mod assets;
pub mod healthz;
pub mod logout;

use actix_web::HttpRequest;
use async_trait::async_trait;

use super::response::Response;

/// A request handler for one of the server's path classes.
///
/// Requests are screened to GET before dispatch, so handlers receive the
/// request and its path only. Actix requests are handled on a
/// single-threaded worker, hence `?Send`.
#[async_trait(?Send)]
pub trait Handler {
    async fn handle(&self, path: &str, req: HttpRequest) -> Response;
}
