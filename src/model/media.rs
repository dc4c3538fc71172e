//! Image and video resources referenced by accessory views
//!
//! A media payload is resolved eagerly, trying in order:
//! 1. a file on the local filesystem
//! 2. an `http(s)` URL, fetched with a bounded timeout
//! 3. inline base64 data
//!
//! Videos also accept the keyed form `/url <source> [/autoplay] [/delay N]`.

use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::MediaConfig;
use crate::payload::{scan, DirectiveKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Where the media bytes were found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    Path,
    Url,
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoKey {
    Url,
    Autoplay,
    Delay,
}

impl DirectiveKey for VideoKey {
    fn name(self) -> &'static str {
        match self {
            VideoKey::Url => "url",
            VideoKey::Autoplay => "autoplay",
            VideoKey::Delay => "delay",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "url" => Some(VideoKey::Url),
            "autoplay" => Some(VideoKey::Autoplay),
            "delay" => Some(VideoKey::Delay),
            _ => None,
        }
    }
}

/// A resolved media resource
#[derive(Debug, Clone, Serialize)]
pub struct MediaDescriptor {
    pub media_type: MediaType,
    /// The payload the media was created from
    pub media_payload: String,
    pub source: MediaSource,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub byte_len: usize,
    pub autoplay: bool,
    /// Seconds before autoplay starts
    pub autoplay_delay: u64,
    /// GIF content
    pub is_animated: bool,
}

/// Resolves media payloads into [`MediaDescriptor`]s.
pub struct MediaLoader {
    client: reqwest::blocking::Client,
    default_autoplay_delay: u64,
}

impl MediaLoader {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            default_autoplay_delay: config.default_autoplay_delay_secs,
        })
    }

    /// Resolve `payload`; `None` when every source failed.
    pub fn load(&self, media_type: MediaType, payload: &str) -> Option<MediaDescriptor> {
        if let Some((source, data)) = self.resolve(media_type, payload.trim()) {
            return Some(self.descriptor(media_type, payload, source, data, false, None));
        }

        if media_type == MediaType::Video {
            if let Some(media) = self.load_keyed_video(payload) {
                return Some(media);
            }
        }

        warn!("Unable to load {:?} from {}", media_type, payload);
        None
    }

    fn load_keyed_video(&self, payload: &str) -> Option<MediaDescriptor> {
        let directives = scan::<VideoKey>(payload);
        let url = directives.iter().find(|d| d.key == VideoKey::Url)?;
        let (source, data) = self.resolve(MediaType::Video, &repair_scheme(&url.value))?;

        let autoplay = directives.iter().any(|d| d.key == VideoKey::Autoplay);
        let delay = directives
            .iter()
            .find(|d| d.key == VideoKey::Delay)
            .and_then(|d| d.value.parse::<u64>().ok());

        Some(self.descriptor(MediaType::Video, payload, source, data, autoplay, delay))
    }

    fn descriptor(
        &self,
        media_type: MediaType,
        payload: &str,
        source: MediaSource,
        data: Vec<u8>,
        autoplay: bool,
        delay: Option<u64>,
    ) -> MediaDescriptor {
        MediaDescriptor {
            media_type,
            media_payload: payload.to_string(),
            source,
            byte_len: data.len(),
            is_animated: is_gif(&data),
            data,
            autoplay,
            autoplay_delay: delay.unwrap_or(self.default_autoplay_delay),
        }
    }

    fn resolve(&self, media_type: MediaType, candidate: &str) -> Option<(MediaSource, Vec<u8>)> {
        if candidate.is_empty() {
            return None;
        }

        let path = Path::new(candidate);
        if path.is_file() {
            match std::fs::read(path) {
                Ok(data) => return Some((MediaSource::Path, data)),
                Err(e) => warn!("Failed to read media file {}: {}", path.display(), e),
            }
        }

        if let Some(url) = remote_url(candidate) {
            match self.fetch(url) {
                Ok(data) => return Some((MediaSource::Url, data)),
                Err(e) => warn!("Failed to fetch media from {}: {:#}", candidate, e),
            }
        }

        decode_inline(candidate)
            .filter(|data| sniff_format(media_type, data))
            .map(|data| (MediaSource::Base64, data))
    }

    fn fetch(&self, url: reqwest::Url) -> Result<Vec<u8>> {
        debug!("Fetching media from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .context("Request failed")?
            .error_for_status()
            .context("Unexpected HTTP status")?;
        let bytes = response.bytes().context("Failed to read response body")?;
        Ok(bytes.to_vec())
    }
}

fn remote_url(candidate: &str) -> Option<reqwest::Url> {
    reqwest::Url::parse(candidate)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// `//` collapses to `/` in payloads, so `https://host` arrives as `https:/host`.
fn repair_scheme(value: &str) -> String {
    for scheme in ["https:/", "http:/"] {
        if let Some(rest) = value.strip_prefix(scheme) {
            if !rest.starts_with('/') {
                return format!("{}/{}", scheme, rest);
            }
        }
    }
    value.to_string()
}

/// Base64 decode, ignoring characters outside the alphabet.
fn decode_inline(candidate: &str) -> Option<Vec<u8>> {
    let cleaned: String = candidate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .ok()
        .filter(|data| !data.is_empty())
}

fn is_gif(data: &[u8]) -> bool {
    data.starts_with(b"GIF")
}

fn sniff_format(media_type: MediaType, data: &[u8]) -> bool {
    match media_type {
        MediaType::Image => {
            data.starts_with(b"\x89PNG\r\n\x1a\n")
                || data.starts_with(&[0xFF, 0xD8, 0xFF])
                || data.starts_with(b"GIF8")
                || data.starts_with(b"BM")
                || data.starts_with(b"II*\0")
                || data.starts_with(b"MM\0*")
                || (data.starts_with(b"RIFF") && data.get(8..12) == Some(b"WEBP".as_slice()))
        }
        MediaType::Video => {
            data.get(4..8) == Some(b"ftyp".as_slice())
                || data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3])
                || (data.starts_with(b"RIFF") && data.get(8..12) == Some(b"AVI ".as_slice()))
        }
    }
}
