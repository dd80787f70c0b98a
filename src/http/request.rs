//! Request head parsing and rewriting.
//!
//! # Responsibilities
//! - Split the raw head into method, target, version and ordered header lines
//! - Rewrite absolute-form targets to origin-form for upstream transmission
//! - Normalize connection-control headers to `Connection: close`
//! - Extract the origin address from the Host header (HTTP) or the
//!   request target (CONNECT)

use std::fmt;

use url::Url;

use crate::http::ProxyError;

/// An origin server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAddr {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A parsed HTTP/1.x request head.
///
/// Header lines keep their original order and duplicates; rewriting produces
/// new request text rather than mutating the captured head.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Method token, uppercased for dispatch.
    pub method: String,
    /// The literal request-target token, exactly as the client sent it.
    /// This is also the cache key.
    pub target: String,
    /// HTTP version token (e.g. "HTTP/1.1").
    pub version: String,
    header_lines: Vec<String>,
}

impl RequestHead {
    /// Parse a framed request head.
    ///
    /// The request line must carry at least method, target and version
    /// tokens. Header lines are collected up to the first blank line.
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        let mut lines = raw.split("\r\n");
        let request_line = lines.next().unwrap_or_default();

        let mut tokens = request_line.split_whitespace();
        let (method, target, version) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(m), Some(t), Some(v)) => (m, t, v),
            _ => return Err(ProxyError::MalformedRequest(request_line.to_string())),
        };

        let header_lines = lines
            .take_while(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            method: method.to_ascii_uppercase(),
            target: target.to_string(),
            version: version.to_string(),
            header_lines,
        })
    }

    /// Whether this request asks for a raw tunnel.
    pub fn is_connect(&self) -> bool {
        self.method == "CONNECT"
    }

    /// Build the request text sent upstream.
    ///
    /// Absolute-form targets are reduced to path+query (the Host header is
    /// the forwarding authority); origin-form targets pass through. Every
    /// `Connection:` or `Proxy-Connection:` header becomes exactly
    /// `Connection: close`, forcing non-persistent upstream connections.
    pub fn rewrite_for_origin(&self) -> String {
        let path = origin_form(&self.target);

        let mut out = String::new();
        out.push_str(&self.method);
        out.push(' ');
        out.push_str(&path);
        out.push(' ');
        out.push_str(&self.version);
        out.push_str("\r\n");

        for line in &self.header_lines {
            if header_matches(line, "Connection") || header_matches(line, "Proxy-Connection") {
                out.push_str("Connection: close");
            } else {
                out.push_str(line);
            }
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out
    }

    /// Origin address from the Host header.
    ///
    /// `Host: example.com` yields port 80; `Host: example.com:8443` parses
    /// the explicit port. A request with no Host header cannot be routed.
    pub fn host_address(&self) -> Result<TargetAddr, ProxyError> {
        let value = self
            .header_lines
            .iter()
            .find_map(|line| header_value(line, "Host"))
            .ok_or(ProxyError::MissingHost)?;

        match value.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| ProxyError::BadPort(value.to_string()))?;
                Ok(TargetAddr {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(TargetAddr {
                host: value.to_string(),
                port: 80,
            }),
        }
    }

    /// Origin address from a CONNECT target, which must be `host:port` with
    /// both parts present.
    pub fn tunnel_address(&self) -> Result<TargetAddr, ProxyError> {
        let (host, port) = self
            .target
            .split_once(':')
            .ok_or_else(|| ProxyError::BadTunnelTarget(self.target.clone()))?;

        if host.is_empty() {
            return Err(ProxyError::BadTunnelTarget(self.target.clone()));
        }
        let port = port
            .parse()
            .map_err(|_| ProxyError::BadTunnelTarget(self.target.clone()))?;

        Ok(TargetAddr {
            host: host.to_string(),
            port,
        })
    }
}

/// Reduce an absolute-form target to path+query; anything else passes
/// through untouched.
fn origin_form(target: &str) -> String {
    if !target.starts_with("http://") && !target.starts_with("https://") {
        return target.to_string();
    }
    match Url::parse(target) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) => target.to_string(),
    }
}

fn header_matches(line: &str, name: &str) -> bool {
    header_value(line, name).is_some()
}

/// Value of `line` if its header name case-insensitively equals `name`.
fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (field, value) = line.split_once(':')?;
    if field.trim().eq_ignore_ascii_case(name) {
        Some(value.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(raw: &str) -> RequestHead {
        RequestHead::parse(raw).unwrap()
    }

    #[test]
    fn parses_request_line_and_uppercases_method() {
        let h = head("connect example.com:443 HTTP/1.1\r\n\r\n");
        assert_eq!(h.method, "CONNECT");
        assert!(h.is_connect());
        assert_eq!(h.target, "example.com:443");
        assert_eq!(h.version, "HTTP/1.1");
    }

    #[test]
    fn rejects_short_request_line() {
        assert!(matches!(
            RequestHead::parse("GET /\r\n\r\n"),
            Err(ProxyError::MalformedRequest(_))
        ));
        assert!(matches!(
            RequestHead::parse(""),
            Err(ProxyError::MalformedRequest(_))
        ));
    }

    #[test]
    fn rewrites_absolute_form_to_origin_form() {
        let h = head("GET http://example.com/a?x=1 HTTP/1.1\r\nHost: example.com\r\n\r\n");
        let rewritten = h.rewrite_for_origin();
        assert!(rewritten.starts_with("GET /a?x=1 HTTP/1.1\r\n"));
        // The literal target is untouched; it stays the cache key.
        assert_eq!(h.target, "http://example.com/a?x=1");
    }

    #[test]
    fn passes_origin_form_through() {
        let h = head("GET /already/origin?q=2 HTTP/1.1\r\nHost: example.com\r\n\r\n");
        assert!(h
            .rewrite_for_origin()
            .starts_with("GET /already/origin?q=2 HTTP/1.1\r\n"));
    }

    #[test]
    fn bare_authority_url_rewrites_to_root_path() {
        let h = head("GET http://example.com HTTP/1.1\r\nHost: example.com\r\n\r\n");
        assert!(h.rewrite_for_origin().starts_with("GET / HTTP/1.1\r\n"));
    }

    #[test]
    fn normalizes_connection_headers_any_casing() {
        let raw = "GET / HTTP/1.1\r\n\
                   Host: example.com\r\n\
                   cOnNeCtIoN: keep-alive\r\n\
                   Accept: */*\r\n\
                   PROXY-CONNECTION: keep-alive\r\n\r\n";
        let rewritten = head(raw).rewrite_for_origin();

        let lines: Vec<&str> = rewritten.split("\r\n").collect();
        assert_eq!(
            lines,
            vec![
                "GET / HTTP/1.1",
                "Host: example.com",
                "Connection: close",
                "Accept: */*",
                "Connection: close",
                "",
                "",
            ]
        );
    }

    #[test]
    fn preserves_header_order_and_duplicates() {
        let raw = "GET / HTTP/1.1\r\n\
                   Host: example.com\r\n\
                   X-Tag: one\r\n\
                   X-Tag: two\r\n\r\n";
        let rewritten = head(raw).rewrite_for_origin();
        let one = rewritten.find("X-Tag: one").unwrap();
        let two = rewritten.find("X-Tag: two").unwrap();
        assert!(one < two);
    }

    #[test]
    fn rewritten_head_ends_with_single_blank_line() {
        let h = head("GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
        let rewritten = h.rewrite_for_origin();
        assert!(rewritten.ends_with("\r\n\r\n"));
        assert!(!rewritten.ends_with("\r\n\r\n\r\n"));
    }

    #[test]
    fn host_without_port_defaults_to_80() {
        let h = head("GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
        assert_eq!(
            h.host_address().unwrap(),
            TargetAddr {
                host: "example.com".to_string(),
                port: 80
            }
        );
    }

    #[test]
    fn host_with_port_parses_it() {
        let h = head("GET / HTTP/1.1\r\nhost: example.com:8443\r\n\r\n");
        assert_eq!(
            h.host_address().unwrap(),
            TargetAddr {
                host: "example.com".to_string(),
                port: 8443
            }
        );
    }

    #[test]
    fn missing_host_is_an_error() {
        let h = head("GET / HTTP/1.1\r\nAccept: */*\r\n\r\n");
        assert!(matches!(h.host_address(), Err(ProxyError::MissingHost)));
    }

    #[test]
    fn unparseable_host_port_is_an_error() {
        let h = head("GET / HTTP/1.1\r\nHost: example.com:notaport\r\n\r\n");
        assert!(matches!(h.host_address(), Err(ProxyError::BadPort(_))));
    }

    #[test]
    fn tunnel_address_requires_host_and_port() {
        let h = head("CONNECT example.com:443 HTTP/1.1\r\n\r\n");
        assert_eq!(
            h.tunnel_address().unwrap(),
            TargetAddr {
                host: "example.com".to_string(),
                port: 443
            }
        );

        let no_port = head("CONNECT example.com HTTP/1.1\r\n\r\n");
        assert!(matches!(
            no_port.tunnel_address(),
            Err(ProxyError::BadTunnelTarget(_))
        ));

        let bad_port = head("CONNECT example.com:https HTTP/1.1\r\n\r\n");
        assert!(matches!(
            bad_port.tunnel_address(),
            Err(ProxyError::BadTunnelTarget(_))
        ));
    }
}
