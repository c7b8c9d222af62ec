//! Inbound URL validation and platform detection.

use url::Url;

use crate::core::config::{INSTAGRAM_HOSTS, X_HOSTS};

/// Maximum URL length (RFC 7230 recommends 8000, but we use 2048 for safety)
pub const MAX_URL_LENGTH: usize = 2048;

/// Source platform of a recognized link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Instagram,
    X,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::X => "x",
        }
    }
}

/// Classifies a message text as an X or Instagram link.
///
/// Returns `None` for anything that is not an http(s) URL on a known host;
/// such messages are ignored rather than answered with an error, since most
/// chat text is not meant for the bot.
pub fn parse_platform(text: &str) -> Option<Platform> {
    if text.len() > MAX_URL_LENGTH {
        return None;
    }

    let url = Url::parse(text).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if INSTAGRAM_HOSTS.contains(&host.as_str()) {
        Some(Platform::Instagram)
    } else if X_HOSTS.contains(&host.as_str()) {
        Some(Platform::X)
    } else {
        None
    }
}
