use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ScanError};

/// Tolerance when checking that score weights sum to one
const WEIGHT_EPSILON: f64 = 1e-6;

/// Hard ceiling on link probes per page, whatever the config says
pub const MAX_LINK_CHECKS_CAP: usize = 25;

/// Global seo-booster configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Network client settings shared by every scan
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Weights used to combine sub-scores into the overall score
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Text statistics and report sizing
    #[serde(default)]
    pub text: TextConfig,
}

/// HTTP settings for page fetches and link checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for the page fetch itself
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for each link liveness probe
    #[serde(default = "default_link_timeout")]
    pub link_timeout_secs: u64,

    /// Upper bound on link probes per page, at most `MAX_LINK_CHECKS_CAP`
    #[serde(default = "default_max_link_checks")]
    pub max_link_checks: usize,

    /// Optional overall deadline for analysing one URL
    #[serde(default)]
    pub scan_budget_secs: Option<u64>,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; seo-booster/0.1; +https://github.com/seo-booster/seo-booster)"
        .to_string()
}

fn default_page_timeout() -> u64 {
    10
}

fn default_link_timeout() -> u64 {
    5
}

fn default_max_link_checks() -> usize {
    25
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout(),
            link_timeout_secs: default_link_timeout(),
            max_link_checks: default_max_link_checks(),
            scan_budget_secs: None,
        }
    }
}

impl FetchConfig {
    /// Configured probe limit, never above the cap
    pub fn link_check_limit(&self) -> usize {
        self.max_link_checks.min(MAX_LINK_CHECKS_CAP)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn link_timeout(&self) -> Duration {
        Duration::from_secs(self.link_timeout_secs)
    }

    pub fn scan_budget(&self) -> Option<Duration> {
        self.scan_budget_secs.map(Duration::from_secs)
    }
}

/// Relative importance of each sub-score in the overall score.
///
/// The five weights must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub content: f64,
    pub keyword: f64,
    pub technical: f64,
    pub onpage: f64,
    pub links: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            content: 0.25,
            keyword: 0.20,
            technical: 0.20,
            onpage: 0.18,
            links: 0.17,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.content + self.keyword + self.technical + self.onpage + self.links
    }

    /// Reject negative weights and weights that do not sum to one
    pub fn validate(&self) -> Result<()> {
        let all = [self.content, self.keyword, self.technical, self.onpage, self.links];
        if all.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(ScanError::Config(
                "Score weights must be finite and non-negative".into(),
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ScanError::Config(format!(
                "Score weights must sum to 1.0 (got {:.4})",
                sum
            )));
        }
        Ok(())
    }
}

/// Text analysis tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    /// Word count that earns full length credit in the content score
    #[serde(default = "default_target_words")]
    pub target_word_count: usize,

    /// Number of ranked terms surfaced in the page summary
    #[serde(default = "default_ranked_terms")]
    pub ranked_terms: usize,

    /// Minimum number of tips in a report
    #[serde(default = "default_min_tips")]
    pub min_tips: usize,
}

fn default_target_words() -> usize {
    800
}

fn default_ranked_terms() -> usize {
    10
}

fn default_min_tips() -> usize {
    6
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            target_word_count: default_target_words(),
            ranked_terms: default_ranked_terms(),
            min_tips: default_min_tips(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Supports SEO_BOOSTER_CONFIG environment variable to point at another file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ScanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.fetch.page_timeout_secs == 0 || self.fetch.link_timeout_secs == 0 {
            return Err(ScanError::Config("Timeouts must be at least 1 second".into()));
        }
        if self.fetch.max_link_checks > MAX_LINK_CHECKS_CAP {
            return Err(ScanError::Config(format!(
                "max_link_checks must be at most {} (got {})",
                MAX_LINK_CHECKS_CAP, self.fetch.max_link_checks
            )));
        }
        if self.text.target_word_count == 0 {
            return Err(ScanError::Config("target_word_count must be positive".into()));
        }
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SEO_BOOSTER_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "seo-booster").ok_or_else(|| {
            ScanError::Config("Could not determine config directory".into())
        })?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
