#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

use crate::core::{ConfigProvider, DelayRange};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_STUDENT_ROLE: &str = "Student";
pub const DEFAULT_EXCLUDED_NAME: &str = "demostudent";
pub const DEFAULT_LISTING_DELAY: DelayRange = DelayRange::new(1000, 2000);
pub const DEFAULT_PROFILE_DELAY: DelayRange = DelayRange::new(500, 1000);
pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_STORE_FILE: &str = "user_emails.json";
pub const DEFAULT_LOG_FILE: &str = "eclass_scrape.log";

/// 合併預設值、TOML 與命令列後的最終設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperSettings {
    pub base_url: String,
    pub cookies: Vec<(String, String)>,
    pub timeout_seconds: u64,
    pub student_role: String,
    pub excluded_name: String,
    pub listing_delay: DelayRange,
    pub profile_delay: DelayRange,
    pub output_path: String,
    pub store_file: String,
    pub log_file: String,
}

impl ScraperSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cookies: Vec::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            student_role: DEFAULT_STUDENT_ROLE.to_string(),
            excluded_name: DEFAULT_EXCLUDED_NAME.to_string(),
            listing_delay: DEFAULT_LISTING_DELAY,
            profile_delay: DEFAULT_PROFILE_DELAY,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            store_file: DEFAULT_STORE_FILE.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }

    /// 同名 cookie 會被覆寫
    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    pub fn without_delays(mut self) -> Self {
        self.listing_delay = DelayRange::none();
        self.profile_delay = DelayRange::none();
        self
    }
}

fn validate_delay(field_name: &str, range: &DelayRange) -> Result<()> {
    if range.min_ms > range.max_ms {
        return Err(ScrapeError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!(
                "min_ms ({}) must not exceed max_ms ({})",
                range.min_ms, range.max_ms
            ),
        });
    }
    Ok(())
}

impl Validate for ScraperSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_non_empty_string("student_role", &self.student_role)?;
        validate_delay("listing_delay", &self.listing_delay)?;
        validate_delay("profile_delay", &self.profile_delay)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_path("store_file", &self.store_file)?;
        validation::validate_path("log_file", &self.log_file)?;

        for (name, _) in &self.cookies {
            validation::validate_non_empty_string("cookies", name)?;
        }
        Ok(())
    }
}

impl ConfigProvider for ScraperSettings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn student_role(&self) -> &str {
        &self.student_role
    }

    fn excluded_name(&self) -> &str {
        &self.excluded_name
    }

    fn listing_delay(&self) -> DelayRange {
        self.listing_delay
    }

    fn profile_delay(&self) -> DelayRange {
        self.profile_delay
    }

    fn store_file(&self) -> &str {
        &self.store_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ScraperSettings::new("https://eclass.example.edu");

        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.listing_delay(), DelayRange::new(1000, 2000));
        assert_eq!(settings.profile_delay(), DelayRange::new(500, 1000));
        assert_eq!(settings.store_file(), "user_emails.json");
        assert_eq!(settings.log_file, "eclass_scrape.log");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_set_cookie_overrides_by_name() {
        let mut settings = ScraperSettings::new("https://eclass.example.edu");
        settings.set_cookie("MoodleSession", "old");
        settings.set_cookie("MOODLEID1_", "id");
        settings.set_cookie("MoodleSession", "new");

        assert_eq!(
            settings.cookies(),
            &[
                ("MoodleSession".to_string(), "new".to_string()),
                ("MOODLEID1_".to_string(), "id".to_string()),
            ]
        );
    }

    #[test]
    fn test_validation_rejects_inverted_delay() {
        let mut settings = ScraperSettings::new("https://eclass.example.edu");
        settings.profile_delay = DelayRange::new(900, 100);

        assert!(matches!(
            settings.validate(),
            Err(ScrapeError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_base_url() {
        let settings = ScraperSettings::new("eclass.example.edu");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_without_delays() {
        let settings = ScraperSettings::new("https://eclass.example.edu").without_delays();
        assert!(settings.listing_delay().is_zero());
        assert!(settings.profile_delay().is_zero());
    }
}
