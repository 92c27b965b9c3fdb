use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::server::authz::GuestPolicy;
use crate::server::gateway;

mod defaults;

/// Configuration for the dashboard edge server.
///
/// Values come from three layers, later layers winning: built-in defaults,
/// an optional TOML file, and the environment variables the platform sets
/// on deployed services (`gateway_url`, `dns_suffix`, and friends).
/// Everything is resolved here once; request handlers receive plain values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,

    /// Base URL of the functions gateway. Empty means the conventional
    /// in-cluster default, see `gateway::service_url`.
    #[serde(default = "defaults::empty")]
    pub gateway_url: String,

    /// DNS suffix appended to the gateway host for cluster-local routing.
    #[serde(default = "defaults::empty")]
    pub dns_suffix: String,

    /// Domain the session cookie is scoped to when cleared on logout.
    #[serde(default = "defaults::empty")]
    pub cookie_root_domain: String,

    #[serde(default = "defaults::base_href")]
    pub base_href: String,

    #[serde(default = "defaults::empty")]
    pub public_url: String,

    #[serde(default = "defaults::empty")]
    pub pretty_url: String,

    #[serde(default = "defaults::disable")]
    pub query_pretty_url: bool,

    /// Directory holding the built SPA (`dist/index.html`, `dist/logout.html`
    /// and the hashed asset files referenced by them).
    #[serde(default = "defaults::assets_dir")]
    pub assets_dir: String,

    /// What to do with requests that carry no decodable session claims.
    #[serde(default)]
    pub guest_policy: GuestPolicy,

    #[serde(default = "defaults::proxy_timeout_secs")]
    pub proxy_timeout_secs: u64,

    pub keep_alive_secs: Option<u64>,

    pub workers: Option<u64>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        EdgeConfig {
            bind: defaults::bind(),
            gateway_url: defaults::empty(),
            dns_suffix: defaults::empty(),
            cookie_root_domain: defaults::empty(),
            base_href: defaults::base_href(),
            public_url: defaults::empty(),
            pretty_url: defaults::empty(),
            query_pretty_url: defaults::disable(),
            assets_dir: defaults::assets_dir(),
            guest_policy: GuestPolicy::default(),
            proxy_timeout_secs: defaults::proxy_timeout_secs(),
            keep_alive_secs: None,
            workers: None,
        }
    }
}

impl EdgeConfig {
    /// Environment variables the platform injects into deployed services.
    /// Each one overrides the matching config field when set.
    const ENV_OVERRIDES: [&'static str; 7] = [
        "gateway_url",
        "dns_suffix",
        "cookie_root_domain",
        "base_href",
        "public_url",
        "pretty_url",
        "query_pretty_url",
    ];

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = Self::read_file(path)?;
        cfg.apply_env();
        cfg.complete().context("validate config")?;
        Ok(cfg)
    }

    fn read_file(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from("faasdash.toml"), false),
        };

        match fs::read_to_string(&path) {
            Ok(toml_str) => toml::from_str(&toml_str)
                .with_context(|| format!("parse config file '{}'", path.display())),

            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if required {
                    bail!("config file '{}' not found", path.display());
                }
                Ok(Self::default())
            }

            Err(err) => Err(err).with_context(|| format!("read config file '{}'", path.display())),
        }
    }

    fn apply_env(&mut self) {
        for key in Self::ENV_OVERRIDES {
            let Ok(value) = env::var(key) else { continue };
            match key {
                "gateway_url" => self.gateway_url = value,
                "dns_suffix" => self.dns_suffix = value,
                "cookie_root_domain" => self.cookie_root_domain = value,
                "base_href" => self.base_href = value,
                "public_url" => self.public_url = value,
                "pretty_url" => self.pretty_url = value,
                "query_pretty_url" => self.query_pretty_url = value.eq_ignore_ascii_case("true"),
                _ => unreachable!(),
            }
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.bind.is_empty() {
            bail!("bind is required");
        }

        // Resolve the gateway base once so a malformed URL aborts startup
        // instead of producing garbage proxy targets later.
        gateway::service_url(&self.gateway_url, &self.dns_suffix).context("gateway_url")?;

        if self.assets_dir.is_empty() {
            bail!("assets_dir is required");
        }

        if self.proxy_timeout_secs == 0 {
            bail!("proxy_timeout_secs must be greater than 0");
        }

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            if keep_alive_secs == 0 {
                bail!("keep_alive_secs must be greater than 0");
            }
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                bail!("workers must be greater than 0");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EdgeConfig::default();
        assert_eq!(cfg.bind, "0.0.0.0:8081");
        assert_eq!(cfg.base_href, "/");
        assert_eq!(cfg.assets_dir, ".");
        assert_eq!(cfg.guest_policy, GuestPolicy::Allow);
        assert_eq!(cfg.proxy_timeout_secs, 30);
        assert!(!cfg.query_pretty_url);
    }

    #[test]
    fn test_parse_toml() {
        let cfg: EdgeConfig = toml::from_str(
            r#"
            bind = "127.0.0.1:9000"
            gateway_url = "http://gateway:8080"
            dns_suffix = "openfaas"
            guest_policy = "deny"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:9000");
        assert_eq!(cfg.gateway_url, "http://gateway:8080");
        assert_eq!(cfg.dns_suffix, "openfaas");
        assert_eq!(cfg.guest_policy, GuestPolicy::Deny);
    }

    #[test]
    fn test_complete_rejects_bad_values() {
        let mut cfg = EdgeConfig {
            proxy_timeout_secs: 0,
            ..EdgeConfig::default()
        };
        assert!(cfg.complete().is_err());

        let mut cfg = EdgeConfig {
            gateway_url: String::from("http://too:many:colons:8080"),
            dns_suffix: String::from("openfaas"),
            ..EdgeConfig::default()
        };
        assert!(cfg.complete().is_err());

        let mut cfg = EdgeConfig {
            workers: Some(0),
            ..EdgeConfig::default()
        };
        assert!(cfg.complete().is_err());
    }
}
