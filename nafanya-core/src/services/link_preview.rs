// File: src/services/link_preview.rs

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Hosts whose links get a better embed when served through a mirror.
const HOST_REWRITES: [(&str, &str); 7] = [
    ("twitter.com", "vxtwitter.com"),
    ("www.twitter.com", "vxtwitter.com"),
    ("mobile.twitter.com", "vxtwitter.com"),
    ("x.com", "vxtwitter.com"),
    ("www.x.com", "vxtwitter.com"),
    ("instagram.com", "ddinstagram.com"),
    ("www.instagram.com", "ddinstagram.com"),
];

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("valid url pattern"));

fn rewrite_host(host: &str) -> Option<&'static str> {
    HOST_REWRITES
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(host))
        .map(|(_, to)| *to)
}

/// Every supported link in `text`, rewritten to its mirror host.
pub fn fix_links(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .filter_map(|m| Url::parse(m.as_str()).ok())
        .filter_map(|mut url| {
            let target = rewrite_host(url.host_str()?)?;
            url.set_host(Some(target)).ok()?;
            Some(url.to_string())
        })
        .collect()
}

pub fn contains_supported_link(text: &str) -> bool {
    !fix_links(text).is_empty()
}

/// Reply text for one fixed link.
pub fn saved_click_message(username: Option<&str>, first_name: &str, link: &str) -> String {
    let who = match username {
        Some(u) if !u.is_empty() => format!("@{}", u),
        _ => first_name.to_string(),
    };
    format!("Saved {} a click:\n{}", who, link)
}
