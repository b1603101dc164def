use crate::config::ScraperSettings;
use crate::core::DelayRange;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub site: SiteConfig,
    pub scrape: Option<ScrapeConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub cookies: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub student_role: Option<String>,
    pub excluded_name: Option<String>,
    pub listing_delay: Option<DelayRange>,
    pub profile_delay: Option<DelayRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub store_file: Option<String>,
    pub log_file: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScrapeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScrapeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MOODLE_SESSION})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScrapeError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn to_settings(&self) -> ScraperSettings {
        let mut settings = ScraperSettings::new(self.site.base_url.clone());

        if let Some(timeout) = self.site.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        for (name, value) in self.site.cookies.iter().flatten() {
            settings.set_cookie(name.clone(), value.clone());
        }

        if let Some(scrape) = &self.scrape {
            if let Some(role) = &scrape.student_role {
                settings.student_role = role.clone();
            }
            if let Some(excluded) = &scrape.excluded_name {
                settings.excluded_name = excluded.clone();
            }
            if let Some(delay) = scrape.listing_delay {
                settings.listing_delay = delay;
            }
            if let Some(delay) = scrape.profile_delay {
                settings.profile_delay = delay;
            }
        }

        if let Some(output) = &self.output {
            if let Some(path) = &output.path {
                settings.output_path = path.clone();
            }
            if let Some(store_file) = &output.store_file {
                settings.store_file = store_file.clone();
            }
            if let Some(log_file) = &output.log_file {
                settings.log_file = log_file.clone();
            }
        }

        settings
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_settings().validate()
    }
}
