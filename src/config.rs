/// Document loaded when no URL is configured: a percent-encoded minimal
/// HTML page with an empty `#app` container.
pub const DEFAULT_URL: &str =
    "data:text/html,%3C%21DOCTYPE%20html%3E%0A%3Chtml%20lang=%22en%22%3E%0A%3Chead%3E\
     %3Cmeta%20charset=%22utf-8%22%3E%3Cmeta%20http-equiv=%22X-UA-Compatible%22\
     %20content=%22IE=edge%22%3E%3C%2Fhead%3E%0A%3Cbody%3E%3Cdiv%20id=%22app%22\
     %3E%3C%2Fdiv%3E%3Cscript%20type=%22text%2Fjavascript%22%3E%3C%2Fscript%3E\
     %3C%2Fbody%3E%0A%3C%2Fhtml%3E";

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub title: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub debug: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: "hostview".to_string(),
            url: String::new(),         // Empty means DEFAULT_URL
            width: 800,
            height: 600,
            resizable: true,
            debug: false,
        }
    }
}

impl ViewConfig {
    /// The URL the backend should load; empty falls back to [`DEFAULT_URL`].
    pub fn effective_url(&self) -> &str {
        if self.url.is_empty() {
            DEFAULT_URL
        } else {
            &self.url
        }
    }
}

/// Window background color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_default_document() {
        let cfg = ViewConfig::default();
        assert!(cfg.url.is_empty());
        assert_eq!(cfg.effective_url(), DEFAULT_URL);
        assert!(cfg.resizable);
        assert!(!cfg.debug);
    }

    #[test]
    fn configured_url_wins() {
        let cfg = ViewConfig {
            url: "https://example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.effective_url(), "https://example.com/");
    }

    #[test]
    fn default_url_parses() {
        let url = url::Url::parse(DEFAULT_URL).unwrap();
        assert_eq!(url.scheme(), "data");
    }
}
