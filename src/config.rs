//! Runtime settings: command line, environment and `console.conf`.
//!
//! Precedence is CLI/env, then the config file, then built-in defaults. The
//! file uses the same `key = value` format as `keybinds.conf`; blank lines and
//! `#` comments are skipped and unknown keys are ignored.

use clap::Parser;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::HttpDirectoryOptions;
use crate::error::{ConsoleError, Result};

pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";
pub const DEFAULT_LOGIN_EMAIL: &str = "eve.holt@reqres.in";
pub const KEYBINDS_FILE: &str = "keybinds.conf";

#[derive(Parser, Debug, Default)]
#[command(name = "usrdir-console", version, about = "Browse and edit users of a remote REST directory")]
pub struct Cli {
    /// Path to console.conf (defaults to the platform config directory)
    #[arg(long, env = "USRDIR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the user directory API
    #[arg(long, env = "USRDIR_BASE_URL")]
    pub base_url: Option<String>,

    /// Value for the x-api-key header
    #[arg(long, env = "USRDIR_API_KEY")]
    pub api_key: Option<String>,

    /// Write tracing output to this file
    #[arg(long, env = "USRDIR_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Path to keybinds.conf (defaults to the platform config directory)
    #[arg(long, env = "USRDIR_KEYBINDS")]
    pub keybinds: Option<PathBuf>,

    /// Print the resolved settings and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub send_auth_header: bool,
    pub log_file: Option<PathBuf>,
    pub login_email: String,
    pub notice_ttl: Duration,
    pub keybinds: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
            send_auth_header: false,
            log_file: None,
            login_email: DEFAULT_LOGIN_EMAIL.to_string(),
            notice_ttl: Duration::from_secs(3),
            keybinds: default_keybinds_path(),
        }
    }
}

impl Settings {
    /// Resolve settings for a parsed command line.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match &cli.config {
            Some(p) => Some(p.clone()),
            None => Self::default_path().ok().filter(|p| p.exists()),
        };
        let mut settings = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        if let Ok(cwd) = std::env::current_dir() {
            settings.prefer_local_keybinds(&cwd);
        }
        Ok(settings)
    }

    /// Location of `console.conf` under the platform config directory.
    ///
    /// # Returns
    ///
    /// The path (which may not exist yet), or `NoConfigDir` when the platform
    /// exposes no home directory.
    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "usrdir-console")
            .map(|dirs| dirs.config_dir().join("console.conf"))
            .ok_or(ConsoleError::NoConfigDir)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConsoleError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse `key = value` lines on top of the defaults.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let mut s = Self::default();
        for (idx, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            let (key, val) = (key.trim(), val.trim());
            if key.is_empty() {
                continue;
            }
            let bad = || ConsoleError::ConfigValue {
                path: origin.to_path_buf(),
                line: idx + 1,
                key: key.to_string(),
                value: val.to_string(),
            };
            match key {
                "base_url" => s.base_url = val.to_string(),
                "api_key" => s.api_key = non_empty(val),
                "request_timeout_secs" => {
                    s.request_timeout = Duration::from_secs(val.parse().map_err(|_| bad())?)
                }
                "send_auth_header" => s.send_auth_header = parse_bool(val).ok_or_else(bad)?,
                "log_file" => s.log_file = non_empty(val).map(PathBuf::from),
                "login_email" => s.login_email = val.to_string(),
                "notice_ttl_secs" => {
                    s.notice_ttl = Duration::from_secs(val.parse().map_err(|_| bad())?)
                }
                "keybinds" => s.keybinds = PathBuf::from(val),
                _ => {}
            }
        }
        Ok(s)
    }

    /// Use a `keybinds.conf` found in `dir` when no keybinds path was chosen.
    ///
    /// The local file is only ever read. A missing keymap is written to the
    /// config directory, so running from arbitrary directories leaves them clean.
    fn prefer_local_keybinds(&mut self, dir: &Path) {
        if self.keybinds != default_keybinds_path() {
            return;
        }
        let local = dir.join(KEYBINDS_FILE);
        if local.is_file() {
            self.keybinds = local;
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.base_url {
            self.base_url = url.clone();
        }
        if let Some(key) = &cli.api_key {
            self.api_key = non_empty(key);
        }
        if let Some(log) = &cli.log_file {
            self.log_file = Some(log.clone());
        }
        if let Some(kb) = &cli.keybinds {
            self.keybinds = kb.clone();
        }
    }

    pub fn directory_options(&self) -> HttpDirectoryOptions {
        HttpDirectoryOptions {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.request_timeout,
            send_auth_header: self.send_auth_header,
        }
    }

    /// Human-readable dump for `--print-config`; the API key is masked.
    pub fn render(&self) -> String {
        let key = if self.api_key.is_some() { "<set>" } else { "<unset>" };
        let log = self
            .log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        format!(
            "base_url = {}\napi_key = {}\nrequest_timeout_secs = {}\nsend_auth_header = {}\nlog_file = {}\nlogin_email = {}\nnotice_ttl_secs = {}\nkeybinds = {}\n",
            self.base_url,
            key,
            self.request_timeout.as_secs(),
            self.send_auth_header,
            log,
            self.login_email,
            self.notice_ttl.as_secs(),
            self.keybinds.display()
        )
    }
}

/// `keybinds.conf` next to `console.conf`, or in the working directory when the
/// platform has no config directory.
pub fn default_keybinds_path() -> PathBuf {
    ProjectDirs::from("", "", "usrdir-console")
        .map(|dirs| dirs.config_dir().join(KEYBINDS_FILE))
        .unwrap_or_else(|| PathBuf::from(KEYBINDS_FILE))
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
