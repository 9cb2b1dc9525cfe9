//! Reference parsing and normalization for the link and image rules.
//!
//! Parsing is purely syntactic (RFC 3986 appendix B) so that relative references and URNs survive
//! intact; resolution against a base goes through [`url::Url::join`].

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?")
        .expect("reference pattern is valid")
});

static AUTHORITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([^:@]+)(:([^@]+))?@)?([^:@]*)(:([^:@]*))?$")
        .expect("authority pattern is valid")
});

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("invalid authority {0:?}")]
    InvalidAuthority(String),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("cannot resolve relative reference {0:?} without a base")]
    NoBase(String),
    #[error("cannot resolve {reference:?}: {source}")]
    Resolve {
        reference: String,
        #[source]
        source: url::ParseError,
    },
}

/// Syntactic components of a reference. Absent components are `None`; the path is always present
/// but may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UriParts {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UriParts {
    /// A scheme with no authority, e.g. `mailto:` or `data:`.
    pub fn is_urn(&self) -> bool {
        self.scheme.is_some() && self.authority.is_none()
    }

    pub fn is_relative(&self) -> bool {
        self.scheme.is_none() && self.authority.is_none()
    }
}

fn non_empty(m: Option<regex::Match<'_>>) -> Option<String> {
    m.map(|m| m.as_str()).filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn parse(uri: &str) -> Result<UriParts, UriError> {
    let mut parts = UriParts::default();
    // The pattern has no mandatory group, so it matches every input.
    let Some(caps) = URI_PATTERN.captures(uri) else {
        return Ok(parts);
    };
    parts.scheme = non_empty(caps.get(2));
    parts.authority = non_empty(caps.get(4));
    parts.path = caps.get(5).map_or("", |m| m.as_str()).to_string();
    parts.query = non_empty(caps.get(7));
    parts.fragment = non_empty(caps.get(9));

    if let Some(authority) = &parts.authority {
        let caps = AUTHORITY_PATTERN
            .captures(authority)
            .ok_or_else(|| UriError::InvalidAuthority(authority.clone()))?;
        parts.user = non_empty(caps.get(2));
        parts.password = non_empty(caps.get(4));
        parts.host = non_empty(caps.get(5));
        if let Some(port) = caps.get(7).map(|m| m.as_str()).filter(|p| !p.is_empty()) {
            parts.port = Some(
                port.parse::<u16>()
                    .map_err(|_| UriError::InvalidPort(port.to_string()))?,
            );
        }
    }
    Ok(parts)
}

/// Reassembles a reference. A missing scheme with a host yields a scheme-relative `//host/...`
/// reference. The individual host/user/port fields take precedence over `authority` so edits to
/// them are reflected.
pub fn build(parts: &UriParts) -> String {
    let mut out = String::new();
    if let Some(scheme) = &parts.scheme {
        out.push_str(scheme);
        out.push(':');
    }
    if let Some(host) = &parts.host {
        out.push_str("//");
        if let Some(user) = &parts.user {
            out.push_str(user);
            if let Some(password) = &parts.password {
                out.push(':');
                out.push_str(password);
            }
            out.push('@');
        }
        out.push_str(host);
        if let Some(port) = parts.port {
            out.push(':');
            out.push_str(&port.to_string());
        }
    } else if let Some(authority) = &parts.authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(&parts.path);
    if let Some(query) = &parts.query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = &parts.fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Resolves `uri` to absolute form, dropping ports that are the scheme default.
///
/// Relative references need `base`; absolute ones are normalized on their own.
pub fn normalize(uri: &str, base: Option<&Url>) -> Result<UriParts, UriError> {
    let parsed = parse(uri)?;
    let resolved = if parsed.scheme.is_some() {
        Url::parse(uri)
    } else {
        let base = base.ok_or_else(|| UriError::NoBase(uri.to_string()))?;
        base.join(uri)
    }
    .map_err(|source| UriError::Resolve {
        reference: uri.to_string(),
        source,
    })?;
    Ok(from_url(&resolved))
}

fn from_url(url: &Url) -> UriParts {
    let host = url.host_str().map(str::to_string);
    let user = Some(url.username()).filter(|u| !u.is_empty()).map(str::to_string);
    let password = url.password().map(str::to_string);
    // `Url::port` already omits the scheme's default port.
    let port = url.port();
    let authority = host.as_ref().map(|host| {
        let mut authority = String::new();
        if let Some(user) = &user {
            authority.push_str(user);
            if let Some(password) = &password {
                authority.push(':');
                authority.push_str(password);
            }
            authority.push('@');
        }
        authority.push_str(host);
        if let Some(port) = port {
            authority.push(':');
            authority.push_str(&port.to_string());
        }
        authority
    });
    UriParts {
        scheme: Some(url.scheme().to_string()),
        authority,
        user,
        password,
        host,
        port,
        path: url.path().to_string(),
        query: url.query().map(str::to_string),
        fragment: url.fragment().map(str::to_string),
    }
}

/// Lowercased host of `uri`, or `None` for references without an authority.
pub fn extract_domain(uri: &str) -> Option<String> {
    parse(uri).ok()?.host.map(|h| h.to_ascii_lowercase())
}

/// Drops a leading `http:` or `https:` so the reference follows the page's scheme.
pub fn strip_http_scheme(uri: &str) -> &str {
    for prefix in ["https:", "http:"] {
        if let Some(head) = uri.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &uri[prefix.len()..];
            }
        }
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_components() {
        let parts = parse("https://me:pw@Example.com:8443/a/b?x=1#top").unwrap();
        assert_eq!(parts.scheme.as_deref(), Some("https"));
        assert_eq!(parts.authority.as_deref(), Some("me:pw@Example.com:8443"));
        assert_eq!(parts.user.as_deref(), Some("me"));
        assert_eq!(parts.password.as_deref(), Some("pw"));
        assert_eq!(parts.host.as_deref(), Some("Example.com"));
        assert_eq!(parts.port, Some(8443));
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.query.as_deref(), Some("x=1"));
        assert_eq!(parts.fragment.as_deref(), Some("top"));
        assert_eq!(build(&parts), "https://me:pw@Example.com:8443/a/b?x=1#top");
    }

    #[test]
    fn relative_and_urn_references() {
        let rel = parse("../img/a.png").unwrap();
        assert!(rel.is_relative());
        assert_eq!(rel.path, "../img/a.png");

        let mail = parse("mailto:someone@example.com").unwrap();
        assert!(mail.is_urn());
        assert_eq!(build(&mail), "mailto:someone@example.com");

        assert!(!parse("http://example.com").unwrap().is_urn());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert_eq!(
            parse("http://example.com:99999/"),
            Err(UriError::InvalidPort("99999".to_string()))
        );
    }

    #[test]
    fn normalize_resolves_and_drops_default_port() {
        let base = Url::parse("http://example.com/docs/page.html").unwrap();
        let parts = normalize("img/a.png", Some(&base)).unwrap();
        assert_eq!(build(&parts), "http://example.com/docs/img/a.png");

        let parts = normalize("HTTP://Example.com:80/x", None).unwrap();
        assert_eq!(parts.port, None);
        assert_eq!(build(&parts), "http://example.com/x");

        assert!(matches!(normalize("a.png", None), Err(UriError::NoBase(_))));
    }

    #[test]
    fn scheme_relative_build() {
        let mut parts = normalize("https://example.com/a", None).unwrap();
        parts.scheme = None;
        assert_eq!(build(&parts), "//example.com/a");
    }

    #[test]
    fn domain_and_scheme_helpers() {
        assert_eq!(extract_domain("http://WWW.Example.com:81/"), Some("www.example.com".into()));
        assert_eq!(extract_domain("/local"), None);
        assert_eq!(strip_http_scheme("HTTPS://a.org/x"), "//a.org/x");
        assert_eq!(strip_http_scheme("ftp://a.org"), "ftp://a.org");
    }
}
