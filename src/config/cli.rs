use crate::config::toml_config::TomlConfig;
use crate::config::ScraperSettings;
use crate::utils::error::Result;
use crate::utils::validation::{validate_cookie_pair, validate_required_field, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "moodle-scrape")]
#[command(about = "Collect student emails from a Moodle course participants list")]
pub struct CliConfig {
    #[arg(long, help = "Course id passed to /user/index.php?id=")]
    pub course_id: String,

    #[arg(long, help = "Site root, e.g. https://eclass.example.edu")]
    pub base_url: Option<String>,

    #[arg(long = "cookie", value_name = "NAME=VALUE", help = "Session cookie (repeatable)")]
    pub cookies: Vec<String>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub store_file: Option<String>,

    #[arg(long)]
    pub log_file: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 預設值 → TOML → 命令列參數，後者覆寫前者
    pub fn resolve(&self) -> Result<ScraperSettings> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.to_settings(),
            None => {
                let base_url = validate_required_field("base_url", &self.base_url)?;
                ScraperSettings::new(base_url.clone())
            }
        };

        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        for pair in &self.cookies {
            let (name, value) = validate_cookie_pair("cookie", pair)?;
            settings.set_cookie(name, value);
        }
        if let Some(path) = &self.output_path {
            settings.output_path = path.clone();
        }
        if let Some(store_file) = &self.store_file {
            settings.store_file = store_file.clone();
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = log_file.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;
    use crate::utils::error::ScrapeError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_resolve_from_flags() {
        let cli = CliConfig::parse_from([
            "moodle-scrape",
            "--course-id",
            "42",
            "--base-url",
            "https://eclass.example.edu",
            "--cookie",
            "MoodleSession=abc",
            "--cookie",
            "MOODLEID1_=xyz",
        ]);

        let settings = cli.resolve().unwrap();

        assert_eq!(cli.course_id, "42");
        assert_eq!(settings.base_url(), "https://eclass.example.edu");
        assert_eq!(settings.cookies().len(), 2);
        assert_eq!(settings.store_file(), "user_emails.json");
    }

    #[test]
    fn test_resolve_requires_base_url_without_config() {
        let cli = CliConfig::parse_from(["moodle-scrape", "--course-id", "42"]);

        assert!(matches!(
            cli.resolve(),
            Err(ScrapeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_flags_override_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[site]
base_url = "https://from-file.example.edu"

[site.cookies]
MoodleSession = "file-session"

[output]
store_file = "file.json"
"#,
            )
            .unwrap();

        let config_path = temp_file.path().to_str().unwrap().to_string();
        let cli = CliConfig::parse_from([
            "moodle-scrape",
            "--course-id",
            "7",
            "--config",
            config_path.as_str(),
            "--cookie",
            "MoodleSession=cli-session",
            "--store-file",
            "cli.json",
        ]);

        let settings = cli.resolve().unwrap();

        assert_eq!(settings.base_url(), "https://from-file.example.edu");
        assert_eq!(
            settings.cookies(),
            &[("MoodleSession".to_string(), "cli-session".to_string())]
        );
        assert_eq!(settings.store_file(), "cli.json");
    }

    #[test]
    fn test_malformed_cookie_flag_is_rejected() {
        let cli = CliConfig::parse_from([
            "moodle-scrape",
            "--course-id",
            "42",
            "--base-url",
            "https://eclass.example.edu",
            "--cookie",
            "MoodleSession",
        ]);

        assert!(cli.resolve().is_err());
    }
}
