use anyhow::{bail, Result};

/// Conventional in-cluster address of the functions gateway.
pub const DEFAULT_GATEWAY_URL: &str = "http://gateway:8080";

/// Computes the fully-qualified base URL of the gateway from the configured
/// URL and an optional DNS suffix.
///
/// Older deployments configure the suffix directly inside `gateway_url`
/// (`http://gateway.openfaas:8080`), newer ones pass it separately; both
/// must resolve to the same address. A `host:port` form gets the suffix
/// inserted between host and port, a bare name gets it appended.
///
/// Inserting the suffix requires the URL to split into exactly three
/// colon-separated parts (scheme, host, port); anything else is a
/// configuration error.
pub fn service_url(gateway_url: &str, dns_suffix: &str) -> Result<String> {
    if !gateway_url.is_empty() && !dns_suffix.is_empty() && gateway_url.contains(dns_suffix) {
        return Ok(gateway_url.to_string());
    }

    let url = if gateway_url.is_empty() {
        DEFAULT_GATEWAY_URL
    } else {
        gateway_url
    };

    if url.contains(':') {
        if dns_suffix.is_empty() {
            return Ok(url.to_string());
        }
        let parts: Vec<&str> = url.split(':').collect();
        if parts.len() != 3 {
            bail!("invalid gateway url '{url}', expect '<scheme>://<host>:<port>'");
        }
        return Ok(format!("{}:{}.{}:{}", parts[0], parts[1], dns_suffix, parts[2]));
    }

    if dns_suffix.is_empty() {
        Ok(url.to_string())
    } else {
        Ok(format!("{url}.{dns_suffix}"))
    }
}

/// The authority part of a base URL, used to rewrite the `host` header on
/// proxied requests.
pub fn authority(base_url: &str) -> &str {
    base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .unwrap_or(base_url)
}
