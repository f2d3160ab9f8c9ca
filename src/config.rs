//! Project profiles: which projects to install and how.
//!
//! The built-in profiles install a Laravel skeleton from the Laravel
//! cabinet and a WordPress payload through WP-CLI. A TOML file can replace
//! either profile:
//!
//! ```toml
//! [payload]
//! name = "wordpress"
//! command = "wp core download"
//! phar = "wp-cli.phar"
//! default_locale = "en_US"
//!
//! [payload.version]
//! development = "nightly"
//! latest = "latest"
//! ```

use crate::models::{
    ArgumentMap, DownloadRequest, ExternalCommandSpec, InstallOptions, RequestSource,
};
use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LOCALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2,3}(_[A-Za-z0-9]+)*$").unwrap()
});

/// Versions a profile can install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTable {
    /// Last release pinned by the profile, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub development: String,
    pub latest: String,
    /// Installed when not asking for a development build; `latest` if unset
    #[serde(default)]
    pub default: Option<String>,
}

impl VersionTable {
    /// Version used for non-development installs
    pub fn stable(&self) -> &str {
        self.default
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(self.latest.as_str())
    }
}

/// Everything needed to turn CLI options into a [`DownloadRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub name: String,
    pub version: VersionTable,
    /// Base URL of `<version>.<extension>` archives
    #[serde(default)]
    pub source: Option<String>,
    /// External CLI that downloads the project itself
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub phar: Option<String>,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub default_locale: Option<String>,
    /// The only locale for which `--skip-content` is forwarded to the command
    #[serde(default = "default_skip_content_locale")]
    pub skip_content_locale: String,
    /// Files left out with `--skip-content`
    #[serde(default)]
    pub skips: Vec<String>,
    #[serde(default)]
    pub writable_dirs: Vec<String>,
}

fn default_extension() -> String {
    "zip".to_string()
}

fn default_skip_content_locale() -> String {
    "en_US".to_string()
}

fn default_payload_dir() -> String {
    "system".to_string()
}

fn standard_skips() -> Vec<String> {
    [
        ".gitignore",
        ".gitattributes",
        "composer.json",
        "composer.lock",
        "phpunit.xml",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

impl ProjectProfile {
    pub fn laravel() -> Self {
        Self {
            name: "laravel".to_string(),
            version: VersionTable {
                release: Some("5.5.0".to_string()),
                development: "latest-develop".to_string(),
                latest: "latest".to_string(),
                default: None,
            },
            source: Some("http://cabinet.laravel.com".to_string()),
            command: None,
            phar: None,
            extension: default_extension(),
            default_locale: None,
            skip_content_locale: default_skip_content_locale(),
            skips: standard_skips(),
            writable_dirs: vec!["bootstrap/cache".to_string(), "storage".to_string()],
        }
    }

    pub fn wordpress() -> Self {
        Self {
            name: "wordpress".to_string(),
            version: VersionTable {
                release: Some("4.8.2".to_string()),
                development: "nightly".to_string(),
                latest: "latest".to_string(),
                default: Some("latest".to_string()),
            },
            source: None,
            command: Some("wp core download".to_string()),
            phar: Some("wp-cli.phar".to_string()),
            extension: default_extension(),
            default_locale: Some("id_ID".to_string()),
            skip_content_locale: default_skip_content_locale(),
            skips: standard_skips(),
            writable_dirs: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Profile name must not be empty");
        }
        match (&self.source, &self.command) {
            (Some(_), Some(_)) => bail!(
                "Profile '{}' sets both 'source' and 'command'; pick one",
                self.name
            ),
            (None, None) => bail!("Profile '{}' needs a 'source' or a 'command'", self.name),
            _ => {}
        }
        if self.version.latest.is_empty() || self.version.development.is_empty() {
            bail!("Profile '{}' has an empty version", self.name);
        }
        if let Some(locale) = &self.default_locale {
            validate_locale(locale)
                .with_context(|| format!("Invalid default_locale in profile '{}'", self.name))?;
        }
        Ok(())
    }

    /// Build the request installing this profile into `target`
    pub fn request(&self, options: &InstallOptions, target: &Path) -> Result<DownloadRequest> {
        let locale = options.locale.clone().or_else(|| self.default_locale.clone());

        let source = match (&self.source, &self.command) {
            (Some(url), _) => RequestSource::Url(url.clone()),
            (None, Some(command)) => {
                let version = if options.dev {
                    self.version.development.as_str()
                } else {
                    self.version.stable()
                };
                let skip_content = options.skip_content
                    && locale.as_deref() == Some(self.skip_content_locale.as_str());

                let mut args =
                    ArgumentMap::new().with("--path", target.to_string_lossy().to_string());
                if let Some(locale) = &locale {
                    args.insert("--locale", locale.as_str());
                }
                args.insert("--version", version);
                args.insert("--skip-content", skip_content);
                args.insert("--force", options.force);

                RequestSource::Command(ExternalCommandSpec::parse(
                    command,
                    args,
                    self.phar.clone(),
                )?)
            }
            (None, None) => bail!("Profile '{}' has no source", self.name),
        };

        let mut request = DownloadRequest::new(
            self.name.as_str(),
            self.version.stable(),
            source,
            target,
        )?;
        request.development_version = self.version.development.clone();
        request.archive_extension = self.extension.clone();
        request.locale = locale;
        request.is_development_build = options.dev;
        request.force = options.force;
        request.writable_relative_dirs = self.writable_dirs.clone();

        if options.skip_content {
            request.excluded_file_names.extend(self.skips.iter().cloned());
        }
        request
            .excluded_file_names
            .extend(options.skip.iter().filter(|s| !s.is_empty()).cloned());

        Ok(request)
    }
}

/// The skeleton/payload pair installed by `ggwp install`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default = "ProjectProfile::laravel")]
    pub skeleton: ProjectProfile,
    #[serde(default = "ProjectProfile::wordpress")]
    pub payload: ProjectProfile,
    /// Payload location relative to the skeleton
    #[serde(default = "default_payload_dir")]
    pub payload_dir: String,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            skeleton: ProjectProfile::laravel(),
            payload: ProjectProfile::wordpress(),
            payload_dir: default_payload_dir(),
        }
    }
}

impl SetupConfig {
    /// Load `path`, or the user config file if it exists, or the built-ins
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                log::debug!("Using built-in project profiles");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded project profiles from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.skeleton.validate()?;
        self.payload.validate()?;
        if self.payload_dir.is_empty() || Path::new(&self.payload_dir).is_absolute() {
            bail!("payload_dir must be a relative path");
        }
        Ok(())
    }

    /// Skeleton request first, then the payload nested inside it
    pub fn requests(&self, options: &InstallOptions, cwd: &Path) -> Result<Vec<DownloadRequest>> {
        if let Some(locale) = &options.locale {
            validate_locale(locale)?;
        }

        let root = match options.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => cwd.join(name),
            None => cwd.to_path_buf(),
        };

        Ok(vec![
            self.skeleton.request(options, &root)?,
            self.payload.request(options, &root.join(&self.payload_dir))?,
        ])
    }
}

/// `<config dir>/ggwp/setup.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ggwp").join("setup.toml"))
}

pub fn validate_locale(locale: &str) -> Result<()> {
    if !LOCALE_PATTERN.is_match(locale) {
        bail!("Invalid locale '{locale}', expected something like en_US");
    }
    Ok(())
}
