use crate::search_filter::{FilterMode, FilterOptions};
use crate::state::browser::BrowserConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub browser: BrowserSettings,
    pub search: SearchConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Catalog service root, e.g. "https://dummyjson.com"
    pub base_url: String,

    /// Path of the paged products endpoint
    pub products_path: String,

    /// Per-request HTTP timeout
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Rows per page
    pub page_size: usize,

    /// Maximum number of pages offered for navigation (unset = no cap)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_cap: Option<usize>,

    /// Records preselected after the first load
    pub initial_selection: usize,

    /// Pages fetched at startup, including the first one
    pub prefetch_pages: usize,

    /// A page load that takes longer than this turns into an error
    pub load_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before the filter runs
    pub debounce_ms: u64,

    /// "literal", "regex" or "fuzzy"
    pub mode: FilterMode,

    /// Also match id, price and quantity
    pub include_numeric_fields: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use Unicode glyphs for checkboxes and skeleton rows
    pub use_glyphs: bool,

    /// Show the price chart under the table
    pub show_chart: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dummyjson.com".to_string(),
            products_path: "/products".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            page_size: 5,
            page_cap: None,
            initial_selection: 5,
            prefetch_pages: 20, // 20 x 5 = first 100 products searchable at startup
            load_timeout_ms: 15_000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            mode: FilterMode::Literal,
            include_numeric_fields: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_glyphs: true,
            show_chart: true,
        }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// there is no file. Never writes anything.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.browser.page_size == 0 {
            anyhow::bail!("browser.page_size must be at least 1");
        }
        if self.browser.page_cap == Some(0) {
            anyhow::bail!("browser.page_cap must be at least 1 when set");
        }
        if self.source.base_url.trim().is_empty() {
            anyhow::bail!("source.base_url must not be empty");
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("catalog-browser").join("config.toml"))
    }

    /// Settings for the browser state machine
    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            page_size: self.browser.page_size,
            page_cap: self.browser.page_cap,
            initial_selection: self.browser.initial_selection,
            prefetch_pages: self.browser.prefetch_pages.max(1),
            load_timeout: Duration::from_millis(self.browser.load_timeout_ms),
            filter: FilterOptions {
                mode: self.search.mode,
                include_numeric_fields: self.search.include_numeric_fields,
            },
        }
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Catalog Browser Configuration File
# Location: ~/.config/catalog-browser/config.toml (Linux)
#           ~/Library/Application Support/catalog-browser/config.toml (macOS)
#           %APPDATA%\catalog-browser\config.toml (Windows)

[source]
# Root of the catalog service
base_url = "https://dummyjson.com"

# Paged endpoint, called as <base_url><products_path>?skip=N&limit=M
products_path = "/products"

# HTTP timeout for a single request
request_timeout_ms = 10000

[browser]
# Rows per page
page_size = 5

# Cap the number of pages offered for navigation (useful for very large catalogs)
# page_cap = 20

# Records preselected after the first page loads
initial_selection = 5

# Pages fetched at startup (including the first) so search has data to look at
prefetch_pages = 20

# A page that takes longer than this to load is reported as a timeout
load_timeout_ms = 15000

[search]
# Wait this long after the last keystroke before filtering
debounce_ms = 250

# "literal" (plain text), "regex" (invalid patterns match nothing) or "fuzzy"
mode = "literal"

# Also match id, price and quantity
include_numeric_fields = false

[display]
# Unicode checkboxes and skeleton rows; set to false for plain ASCII
use_glyphs = true

# Show the price chart of selected products
show_chart = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn commented_default_matches_default_config() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[browser]\npage_size = 10\npage_cap = 3\n\n[search]\nmode = \"regex\"\n"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.browser.page_size, 10);
        assert_eq!(config.browser.page_cap, Some(3));
        assert_eq!(config.browser.initial_selection, 5);
        assert_eq!(config.search.mode, FilterMode::Regex);
        assert_eq!(config.source.base_url, "https://dummyjson.com");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[browser]\npage_size = 0\n").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn browser_config_carries_search_options() {
        let mut config = Config::default();
        config.search.mode = FilterMode::Fuzzy;
        config.browser.prefetch_pages = 0;
        let browser = config.browser_config();
        assert_eq!(browser.filter.mode, FilterMode::Fuzzy);
        assert_eq!(browser.prefetch_pages, 1);
        assert_eq!(browser.load_timeout, Duration::from_secs(15));
    }
}
