use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::EdgeConfig;
use crate::server::gateway;
use crate::server::handlers::api::ApiHandler;
use crate::server::handlers::assets::AssetsHandler;
use crate::server::handlers::healthz::HealthzHandler;
use crate::server::handlers::logout::LogoutHandler;
use crate::server::proxy::HttpUpstream;

use super::restful::{EdgeHandlers, RestfulServer};

/// Builds the server and its handlers from a validated config.
pub struct ServerFactory {
    cfg: EdgeConfig,
}

impl ServerFactory {
    pub fn new(cfg: EdgeConfig) -> Self {
        Self { cfg }
    }

    pub fn build_server(&self) -> Result<RestfulServer> {
        let handlers = self.build_handlers()?;

        let mut srv = RestfulServer::new(self.cfg.bind.clone(), Arc::new(handlers));
        if let Some(keep_alive_secs) = self.cfg.keep_alive_secs {
            srv.set_keep_alive_secs(keep_alive_secs);
        }
        if let Some(workers) = self.cfg.workers {
            srv.set_workers(workers);
        }

        Ok(srv)
    }

    pub fn build_handlers(&self) -> Result<EdgeHandlers> {
        let gateway_base = gateway::service_url(&self.cfg.gateway_url, &self.cfg.dns_suffix)
            .context("resolve gateway url")?;

        let upstream = HttpUpstream::new(Duration::from_secs(self.cfg.proxy_timeout_secs))
            .context("init gateway client")?;

        let api = ApiHandler::new(self.cfg.guest_policy, gateway_base, Arc::new(upstream));
        let assets = AssetsHandler::new(&self.cfg);
        let logout = LogoutHandler::new(
            self.cfg.cookie_root_domain.clone(),
            PathBuf::from(&self.cfg.assets_dir),
        );
        let healthz = HealthzHandler::new();

        Ok(EdgeHandlers {
            api,
            assets,
            logout,
            healthz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_handlers_rejects_malformed_gateway_url() {
        let cfg = EdgeConfig {
            gateway_url: String::from("http://a:b:c:8080"),
            dns_suffix: String::from("openfaas"),
            ..EdgeConfig::default()
        };
        let factory = ServerFactory::new(cfg);
        assert!(factory.build_handlers().is_err());
    }

    #[test]
    fn test_build_server_with_defaults() {
        let factory = ServerFactory::new(EdgeConfig::default());
        assert!(factory.build_server().is_ok());
    }
}
