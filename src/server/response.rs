use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use super::proxy::UpstreamResponse;

pub const PROXY_ERROR: &str = "Proxy request failed";
pub const ASSET_ERROR: &str = "Failed to read asset";

/// Hop-by-hop and length framing headers the server manages itself; they are
/// never copied from a relayed upstream response.
const MANAGED_HEADERS: [&str; 4] = [
    "connection",
    "content-length",
    "transfer-encoding",
    "keep-alive",
];

/// Wrapper over [`HttpResponse`] with constructors for the handful of
/// response shapes this service produces.
pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    pub fn method_not_allowed() -> Self {
        Self::text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    pub fn forbidden() -> Self {
        Self::text(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "Not found")
    }

    pub fn error(message: &str) -> Self {
        Self::text(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// A static asset with its inferred content type.
    pub fn asset(content_type: &str, data: Vec<u8>) -> Self {
        Self {
            http_response: HttpResponse::Ok()
                .append_header(("Content-Type", content_type))
                .body(data),
        }
    }

    pub fn html(content: String) -> Self {
        Self {
            http_response: HttpResponse::Ok()
                .append_header(("Content-Type", "text/html"))
                .body(content),
        }
    }

    /// Temporary redirect preserving the request method.
    pub fn redirect(location: &str) -> Self {
        Self {
            http_response: HttpResponse::TemporaryRedirect()
                .append_header(("Location", location))
                .finish(),
        }
    }

    pub fn json<T: Serialize>(data: T) -> Self {
        Self {
            http_response: HttpResponse::Ok().json(data),
        }
    }

    /// Relays an upstream response verbatim: its status code, headers and
    /// body, minus the framing headers this server manages itself.
    pub fn upstream(resp: UpstreamResponse) -> Self {
        let status =
            StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = HttpResponseBuilder::new(status);
        for (name, value) in &resp.headers {
            if MANAGED_HEADERS.contains(&name.to_lowercase().as_str()) {
                continue;
            }
            builder.append_header((name.as_str(), value.as_str()));
        }
        Self {
            http_response: builder.body(resp.body),
        }
    }

    /// Appends a header to an already built response; invalid names or
    /// values are dropped rather than panicking mid-request.
    pub fn append_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            self.http_response.headers_mut().append(name, value);
        }
        self
    }

    fn text(status: StatusCode, message: &str) -> Self {
        Self {
            http_response: HttpResponseBuilder::new(status).body(message.to_string()),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_skips_managed_headers() {
        let resp = Response::upstream(UpstreamResponse {
            status: 201,
            headers: vec![
                (String::from("Content-Type"), String::from("application/json")),
                (String::from("Transfer-Encoding"), String::from("chunked")),
                (String::from("X-Call-Id"), String::from("42")),
            ],
            body: b"{}".to_vec(),
        });
        let http: HttpResponse = resp.into();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(
            http.headers().get("Content-Type").unwrap(),
            "application/json"
        );
        assert_eq!(http.headers().get("X-Call-Id").unwrap(), "42");
        assert!(http.headers().get("Transfer-Encoding").is_none());
    }

    #[test]
    fn test_upstream_invalid_status_becomes_500() {
        let resp = Response::upstream(UpstreamResponse {
            status: 0,
            headers: vec![],
            body: vec![],
        });
        let http: HttpResponse = resp.into();
        assert_eq!(http.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_append_header() {
        let http: HttpResponse = Response::html(String::from("<html></html>"))
            .append_header("Set-Cookie", "a=b")
            .into();
        assert_eq!(http.headers().get("Set-Cookie").unwrap(), "a=b");
    }
}
