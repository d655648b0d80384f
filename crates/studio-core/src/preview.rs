use crate::{Error, Result};
use serde::Serialize;
use url::Url;

pub const DEFAULT_PREVIEW_URL: &str = "https://example.com";

/// The embedded read-only page preview
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    url: String,
    pub recording: bool,
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            url: DEFAULT_PREVIEW_URL.to_string(),
            recording: false,
        }
    }
}

impl Preview {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Point the preview at a new address
    ///
    /// Input without a scheme gets `https://`. Anything that ends up with a
    /// scheme other than http or https is rejected.
    pub fn navigate(&mut self, input: &str) -> Result<&str> {
        let input = input.trim();
        let candidate = if has_scheme(input) {
            input.to_string()
        } else {
            format!("https://{}", input)
        };

        let parsed =
            Url::parse(&candidate).map_err(|e| Error::InvalidUrl(format!("{}: {}", input, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                input,
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(Error::InvalidUrl(input.to_string()));
        }

        self.url = parsed.to_string();
        tracing::debug!("Preview navigated to {}", self.url);
        Ok(&self.url)
    }

    pub fn toggle_recording(&mut self) -> bool {
        self.recording = !self.recording;
        self.recording
    }
}

/// True when `input` names its own scheme (`ftp://x`, `mailto:x`).
/// `host:port` forms such as `localhost:5678` do not count.
fn has_scheme(input: &str) -> bool {
    if input.contains("://") {
        return true;
    }
    match input.split_once(':') {
        Some((_, rest)) => {
            Url::parse(input).is_ok() && !rest.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}
