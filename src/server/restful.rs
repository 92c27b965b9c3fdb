use std::sync::Arc;
use std::time::Duration;

use actix_web::http::Method;
use actix_web::web::{self, Data};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::info;
use sd_notify::NotifyState;

use super::handlers::api::ApiHandler;
use super::handlers::assets::AssetsHandler;
use super::handlers::healthz::HealthzHandler;
use super::handlers::logout::LogoutHandler;
use super::handlers::Handler;
use super::response::Response;

/// The handlers behind the HTTP surface, shared across workers.
pub struct EdgeHandlers {
    pub api: ApiHandler,
    pub assets: AssetsHandler,
    pub logout: LogoutHandler,
    pub healthz: HealthzHandler,
}

pub struct RestfulServer {
    bind: String,
    ctx: Arc<EdgeHandlers>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,
}

impl RestfulServer {
    /// API prefixes proxied to the gateway. Anything else under `/api/`
    /// falls through to the asset catch-all like every other path.
    const API_ROUTES: [&'static str; 5] = [
        "/api/list-functions{tail:.*}",
        "/api/system-metrics{tail:.*}",
        "/api/metrics{tail:.*}",
        "/api/pipeline-log{tail:.*}",
        "/api/function-logs{tail:.*}",
    ];

    pub fn new(bind: String, ctx: Arc<EdgeHandlers>) -> Self {
        Self {
            bind,
            ctx,
            keep_alive_secs: None,
            workers: None,
        }
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    /// Registers the full route table on an actix app. Split out so tests
    /// can drive the routing with `actix_web::test::init_service`.
    pub fn configure(ctx: Arc<EdgeHandlers>) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg| {
            cfg.app_data(Data::new(ctx));
            for route in Self::API_ROUTES {
                cfg.route(route, web::get().to(Self::handle_api));
            }
            cfg.route("/healthz", web::get().to(Self::handle_healthz));
            cfg.route("/logout", web::get().to(Self::handle_logout));
            cfg.route("/logout/", web::get().to(Self::handle_logout));
            cfg.default_service(web::route().to(Self::default_handler));
        }
    }

    pub async fn run(self) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut srv = HttpServer::new(move || {
            App::new().configure(Self::configure(ctx.clone()))
        });

        info!("Binding to http://{}", self.bind);
        srv = srv.bind(&self.bind).context("bind address")?;

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting dashboard edge server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn handle_api(req: HttpRequest, ctx: Data<Arc<EdgeHandlers>>) -> HttpResponse {
        let path = req.path().to_string();
        ctx.api.handle(&path, req).await.into()
    }

    async fn handle_healthz(req: HttpRequest, ctx: Data<Arc<EdgeHandlers>>) -> HttpResponse {
        let path = req.path().to_string();
        ctx.healthz.handle(&path, req).await.into()
    }

    async fn handle_logout(req: HttpRequest, ctx: Data<Arc<EdgeHandlers>>) -> HttpResponse {
        let path = req.path().to_string();
        ctx.logout.handle(&path, req).await.into()
    }

    /// Everything that is not an API, logout or health path: non-GET
    /// methods are rejected up front, remaining GETs serve assets.
    async fn default_handler(req: HttpRequest, ctx: Data<Arc<EdgeHandlers>>) -> HttpResponse {
        if req.method() != Method::GET {
            return Response::method_not_allowed().into();
        }
        let path = req.path().to_string();
        ctx.assets.handle(&path, req).await.into()
    }
}
