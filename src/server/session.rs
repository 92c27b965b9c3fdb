use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Name of the session cookie issued by the platform's auth service.
pub const SESSION_COOKIE: &str = "openfaas_cloud_token";

/// Claims carried in the session token payload.
///
/// The token is a three-segment compact token; only the middle (payload)
/// segment is decoded here. Signature verification happens at the platform's
/// edge router before requests reach this service, which is why decoding
/// failure is a value (`None` from [`decode_claims`]) and never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject, the authenticated user identifier.
    #[serde(default)]
    pub sub: String,

    /// Comma-separated organizations the subject belongs to, possibly empty.
    #[serde(default)]
    pub organizations: String,
}

impl SessionClaims {
    /// Organization identifiers, skipping empty entries so an empty claim
    /// yields an empty list rather than a list containing `""`.
    pub fn org_list(&self) -> impl Iterator<Item = &str> {
        self.organizations.split(',').filter(|org| !org.is_empty())
    }

    /// The comma-joined claims injected into the SPA shell: organizations
    /// plus subject when organizations are present, empty otherwise.
    pub fn all_claims(&self) -> String {
        if self.organizations.is_empty() {
            String::new()
        } else {
            format!("{},{}", self.organizations, self.sub)
        }
    }
}

/// Organizations string of an optional claim set, `""` when absent.
pub fn organizations(claims: Option<&SessionClaims>) -> &str {
    claims.map(|c| c.organizations.as_str()).unwrap_or("")
}

/// Extracts the session token value from a `cookie` header.
pub fn token_from_cookie_header(header: Option<&str>) -> Option<&str> {
    let header = header?;
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        if name.trim() == SESSION_COOKIE {
            return Some(value.trim());
        }
    }
    None
}

/// Whether the request carries a session cookie at all. Used for sign-in
/// detection when rendering the SPA shell; the cookie may still fail to
/// decode.
pub fn is_signed_in(header: Option<&str>) -> bool {
    header.is_some_and(|h| h.contains(SESSION_COOKIE))
}

/// Decodes the payload segment of a session token into claims.
///
/// Any malformation (missing segment, bad base64, bad JSON) yields `None`.
pub fn decode_claims(token: &str) -> Option<SessionClaims> {
    let payload = token.split('.').nth(1)?;
    let raw = decode_segment(payload)?;
    serde_json::from_slice(&raw).ok()
}

// Tokens in the wild carry both base64 alphabets, padded and unpadded;
// accept all of them like the decoder this replaces did.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| STANDARD.decode(segment))
        .or_else(|_| STANDARD_NO_PAD.decode(segment))
        .ok()
}

#[cfg(test)]
pub fn encode_token(claims_json: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(claims_json.as_bytes());
    format!("header.{payload}.signature")
}
