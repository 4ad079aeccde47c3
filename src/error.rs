use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Could not reach page: {0}")]
    Unreachable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Stable discriminator reported to callers in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::InvalidUrl(_) => "invalid_url",
            ScanError::Unreachable(_) => "unreachable",
            ScanError::Config(_) => "config",
            ScanError::Json(_) => "json",
            ScanError::Toml(_) => "config",
            ScanError::Io(_) => "io",
        }
    }

    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ScanError::InvalidUrl(_) => Some(
                "Pass a full http:// or https:// URL, e.g.:\n  seo-booster scan https://example.com"
            ),
            ScanError::Unreachable(_) => Some(
                "Check that the site is up and reachable from this machine, or retry with:\n  SEO_BOOSTER_LOG=debug seo-booster scan <url>"
            ),
            ScanError::Config(_) | ScanError::Toml(_) => Some(
                "Inspect the active configuration with `seo-booster config show`\nOr reset it with `seo-booster config init --force`"
            ),
            _ => None,
        }
    }

    /// Whether this failure means the URL could not be analysed at all
    pub fn is_scan_failure(&self) -> bool {
        matches!(self, ScanError::InvalidUrl(_) | ScanError::Unreachable(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
