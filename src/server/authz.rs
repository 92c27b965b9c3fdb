use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::session::SessionClaims;

/// What to do with requests that carry no decodable session claims.
///
/// In the usual deployment the platform's edge router has already
/// authenticated the request before it reaches this service, so `Allow`
/// (the default) passes such requests through. `Deny` is for standalone
/// deployments with no upstream guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuestPolicy {
    #[default]
    Allow,
    Deny,
}

/// API paths whose resource is a function owned by the caller, identified
/// by the `function` query parameter instead of `user`.
const SENSITIVE_PREFIXES: [&str; 2] = ["/api/metrics", "/api/function-logs"];

/// Decides whether the subject in `claims` may access the resource named by
/// the request's query parameters.
///
/// Pure function: the decision is made entirely from its arguments, and the
/// caller must evaluate it before issuing any upstream call.
pub fn is_resource_in_claims(
    path: &str,
    query: &HashMap<String, String>,
    claims: Option<&SessionClaims>,
    policy: GuestPolicy,
) -> bool {
    let claims = match claims {
        Some(claims) => claims,
        None => return policy == GuestPolicy::Allow,
    };

    if SENSITIVE_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return is_function_owned(query.get("function"), claims);
    }

    match query.get("user") {
        Some(user) => user == &claims.sub || claims.org_list().any(|org| org == user.as_str()),
        None => false,
    }
}

/// A function belongs to the caller when its name is prefixed by the
/// subject or one of the subject's organizations, case-insensitively.
fn is_function_owned(function: Option<&String>, claims: &SessionClaims) -> bool {
    let Some(function) = function else {
        return false;
    };
    let function = function.to_lowercase();

    if !claims.sub.is_empty() && function.starts_with(&claims.sub.to_lowercase()) {
        return true;
    }

    claims
        .org_list()
        .any(|org| function.starts_with(&org.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SessionClaims {
        SessionClaims {
            sub: String::from("alice"),
            organizations: String::from("acme,beta"),
        }
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_user_is_subject() {
        let q = query(&[("user", "alice")]);
        assert!(is_resource_in_claims(
            "/api/list-functions",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_user_is_organization() {
        let q = query(&[("user", "acme")]);
        assert!(is_resource_in_claims(
            "/api/list-functions",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_user_is_stranger() {
        let q = query(&[("user", "mallory")]);
        assert!(!is_resource_in_claims(
            "/api/list-functions",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_user_match_is_case_sensitive() {
        let q = query(&[("user", "Alice")]);
        assert!(!is_resource_in_claims(
            "/api/list-functions",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_missing_user_parameter_denies() {
        let q = query(&[]);
        assert!(!is_resource_in_claims(
            "/api/list-functions",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_function_owned_by_subject() {
        let q = query(&[("function", "alice-myfn")]);
        assert!(is_resource_in_claims(
            "/api/function-logs",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_function_owned_by_organization() {
        let q = query(&[("function", "ACME-myfn")]);
        assert!(is_resource_in_claims(
            "/api/metrics",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_function_owned_by_stranger() {
        let q = query(&[("function", "mallory-myfn")]);
        assert!(!is_resource_in_claims(
            "/api/function-logs",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_missing_function_parameter_denies() {
        let q = query(&[("user", "alice")]);
        assert!(!is_resource_in_claims(
            "/api/function-logs",
            &q,
            Some(&alice()),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_empty_organizations_never_prefix_match() {
        let claims = SessionClaims {
            sub: String::from("alice"),
            organizations: String::new(),
        };
        let q = query(&[("function", "mallory-myfn")]);
        assert!(!is_resource_in_claims(
            "/api/metrics",
            &q,
            Some(&claims),
            GuestPolicy::Allow
        ));
    }

    #[test]
    fn test_guest_policy() {
        let q = query(&[("user", "anyone")]);
        assert!(is_resource_in_claims(
            "/api/list-functions",
            &q,
            None,
            GuestPolicy::Allow
        ));
        assert!(!is_resource_in_claims(
            "/api/list-functions",
            &q,
            None,
            GuestPolicy::Deny
        ));
    }

    #[test]
    fn test_idempotent() {
        let q = query(&[("user", "acme")]);
        let first = is_resource_in_claims("/api/list-functions", &q, Some(&alice()), GuestPolicy::Allow);
        let second = is_resource_in_claims("/api/list-functions", &q, Some(&alice()), GuestPolicy::Allow);
        assert_eq!(first, second);
    }
}
