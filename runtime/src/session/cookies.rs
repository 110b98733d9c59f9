//! Parsing of `Cookie:`-style header strings into seed cookies.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use url::Url;

/// A cookie attached to a fresh context before the first navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Origin the cookie is set for, e.g. `https://app.example.com/`.
    pub url: String,
}

/// Cookie domain for a target URL: the registrable domain with a leading dot.
///
/// Hosts with a short two-level suffix (`co.uk`, `com.cn`) keep three labels.
/// The check only looks at label length, so `app.foo.com` also keeps three
/// and becomes `.app.foo.com`. IPv4 hosts are returned whole. Returns `None`
/// when the URL has no host.
pub fn cookie_domain(target: &str) -> Option<String> {
    let url = target_url(target)?;
    let host = url.host_str()?.to_string();

    if host.parse::<Ipv4Addr>().is_ok() {
        return Some(format!(".{host}"));
    }

    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();
    if n <= 2 {
        return Some(format!(".{host}"));
    }
    let short_suffix = labels[n - 2].len() <= 3 && labels[n - 1].len() <= 3;
    let keep = if short_suffix { 3 } else { 2 };
    Some(format!(".{}", labels[n - keep..].join(".")))
}

fn target_url(target: &str) -> Option<Url> {
    let with_scheme = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{target}")
    };
    Url::parse(&with_scheme).ok()
}

/// Parse `"a=1; b=2"` into seed cookies scoped to the target's domain.
///
/// Items without `=` are skipped; values may themselves contain `=`.
pub fn parse_cookie_header(target: &str, header: &str) -> Result<Vec<SeedCookie>, String> {
    let domain = cookie_domain(target).ok_or_else(|| format!("no host in {target}"))?;
    let origin = target_url(target)
        .map(|url| format!("{}/", url.origin().ascii_serialization()))
        .ok_or_else(|| format!("no host in {target}"))?;

    Ok(header
        .split(';')
        .filter_map(|item| {
            let (name, value) = item.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(SeedCookie {
                name: name.to_string(),
                value: value.trim().to_string(),
                domain: domain.clone(),
                path: "/".to_string(),
                url: origin.clone(),
            })
        })
        .collect())
}
