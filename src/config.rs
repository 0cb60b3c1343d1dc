use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

const EXE_DIR_VAR: &str = "${exe_dir}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error opening configuration file {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    #[error("Error parsing configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid site url `{0}`: {1}")]
    InvalidUrl(String, String),
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

#[derive(Deserialize, Clone, Default)]
pub struct Site {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Site {
    pub fn admin_url(&self) -> String {
        format!("{}/wp-admin", self.url.trim_end_matches('/'))
    }

    /// New post form, forced into the classic editor.
    pub fn new_post_url(&self) -> String {
        format!("{}/post-new.php?classic-editor", self.admin_url())
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Paths {
    pub input_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub failed_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            input_dir: PathBuf::from("topost"),
            processed_dir: PathBuf::from("processed"),
            failed_dir: PathBuf::from("failed"),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub implicit_wait_secs: u64,
    pub page_load_timeout_secs: u64,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            implicit_wait_secs: 10,
            page_load_timeout_secs: 15,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: Site,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub log: Option<Log>,
}

impl Config {
    /// `WP_*` variables win over the file.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(url) = lookup("WP_URL") {
            self.site.url = url;
        }
        if let Some(user) = lookup("WP_USER") {
            self.site.username = user;
        }
        if let Some(pass) = lookup("WP_PASS") {
            self.site.password = pass;
        }
        if let Some(dir) = lookup("WP_INPUT_DIR") {
            self.paths.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WP_PROCESSED_DIR") {
            self.paths.processed_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WP_FAILED_DIR") {
            self.paths.failed_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.url.trim().is_empty() {
            return Err(ConfigError::Missing("site.url (or WP_URL)"));
        }

        match Url::parse(&self.site.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => return Err(ConfigError::InvalidUrl(self.site.url.clone(), format!("unsupported scheme {}", url.scheme()))),
            Err(e) => return Err(ConfigError::InvalidUrl(self.site.url.clone(), e.to_string())),
        }

        if self.site.username.is_empty() {
            return Err(ConfigError::Missing("site.username (or WP_USER)"));
        }
        if self.site.password.is_empty() {
            return Err(ConfigError::Missing("site.password (or WP_PASS)"));
        }

        Ok(())
    }

    pub fn create_directories(&self) -> io::Result<()> {
        for dir in [&self.paths.input_dir, &self.paths.processed_dir, &self.paths.failed_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Some(str_path) = path.to_str() else {
        return path;
    };
    if !str_path.starts_with(EXE_DIR_VAR) {
        return path;
    }

    match env::current_exe().ok().as_deref().and_then(Path::parent) {
        Some(exe_dir) => PathBuf::from(str_path.replacen(EXE_DIR_VAR, &exe_dir.to_string_lossy(), 1)),
        None => path,
    }
}

pub fn parse_config(cfg_content: &str) -> Result<Config, ConfigError> {
    let mut cfg: Config = toml::from_str::<Config>(cfg_content)?;

    cfg.paths = Paths {
        input_dir: parse_path(cfg.paths.input_dir),
        processed_dir: parse_path(cfg.paths.processed_dir),
        failed_dir: parse_path(cfg.paths.failed_dir),
    };
    cfg.log = cfg.log.map(|log| Log {
        location: log.location.map(parse_path),
        ..log
    });

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> Result<Config, ConfigError> {
    let cfg_content = fs::read_to_string(cfg_path)
        .map_err(|e| ConfigError::Io(cfg_path.to_path_buf(), e))?;
    parse_config(&cfg_content)
}
