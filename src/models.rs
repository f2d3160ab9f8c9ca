use crate::error::{InstallError, InstallResult};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
    /// Project profiles file (defaults to <config dir>/ggwp/setup.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new GGWP application
    #[command(visible_alias = "setup")]
    Install {
        /// Directory to create the application in (defaults to the current directory)
        name: Option<String>,
        /// Select which language to download (e.g. en_US)
        #[arg(long)]
        locale: Option<String>,
        /// Leave out a file by name while installing, can be specified multiple times
        #[arg(long, value_name = "NAME")]
        skip: Vec<String>,
        /// Leave out the standard GGWP skip list (composer.json, phpunit.xml, ...)
        #[arg(long)]
        skip_content: bool,
        /// Install the latest "development" release
        #[arg(long)]
        dev: bool,
        /// Force install even if the directory already exists
        #[arg(long)]
        force: bool,
        /// Disable ANSI colors, also for dependency manager output
        #[arg(long)]
        no_ansi: bool,
    },
}

/// Options of the `install` command, independent of clap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub name: Option<String>,
    pub locale: Option<String>,
    pub skip: Vec<String>,
    pub skip_content: bool,
    pub dev: bool,
    pub force: bool,
    pub no_ansi: bool,
}

/// Value of a single CLI argument passed to an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Bare switch, emitted only when true
    Flag(bool),
    /// `key=value`
    Value(String),
    /// `key[]=a&key[]=b`
    List(Vec<String>),
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Insertion-ordered argument map for external commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMap {
    entries: Vec<(String, ArgValue)>,
}

impl ArgumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value; a replaced key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A third-party CLI invocation, e.g. `wp core download --path=...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommandSpec {
    /// Short name of the binary (`wp`)
    pub binary_name: String,
    /// Tokens after the binary name (`core download`)
    pub subcommand_tokens: Vec<String>,
    pub arguments: ArgumentMap,
    /// Bundled artifact looked up in the working directory (`wp-cli.phar`)
    pub phar_fallback_name: Option<String>,
}

impl ExternalCommandSpec {
    /// Split a command line like `"wp core download"` into binary and subcommand tokens
    pub fn parse(
        command: &str,
        arguments: ArgumentMap,
        phar_fallback_name: Option<String>,
    ) -> InstallResult<Self> {
        let mut tokens = command.split_whitespace().map(str::to_string);
        let binary_name = tokens
            .next()
            .ok_or_else(|| InstallError::InvalidRequest("empty external command".to_string()))?;

        Ok(Self {
            binary_name,
            subcommand_tokens: tokens.collect(),
            arguments,
            phar_fallback_name: phar_fallback_name.filter(|p| !p.is_empty()),
        })
    }
}

/// How a plan acquires its project tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    /// Base URL; the archive lives at `<url>/<version>.<ext>`
    Url(String),
    /// Delegate the download to a third-party CLI
    Command(ExternalCommandSpec),
}

/// Immutable input to one installation plan run
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub project_name: String,
    pub version: String,
    pub development_version: String,
    pub source: RequestSource,
    pub target_directory: PathBuf,
    pub archive_extension: String,
    pub locale: Option<String>,
    pub is_development_build: bool,
    pub force: bool,
    /// Base names dropped during merge; matched exactly, never as globs
    pub excluded_file_names: HashSet<String>,
    /// Directories, relative to the target, made writable after merge
    pub writable_relative_dirs: Vec<String>,
}

impl DownloadRequest {
    /// Create a request with default extension and no exclusions.
    ///
    /// The target must be absolute.
    pub fn new(
        project_name: impl Into<String>,
        version: impl Into<String>,
        source: RequestSource,
        target_directory: impl Into<PathBuf>,
    ) -> InstallResult<Self> {
        let target_directory = target_directory.into();
        if !target_directory.is_absolute() {
            return Err(InstallError::InvalidRequest(format!(
                "target directory must be absolute: {}",
                target_directory.display()
            )));
        }

        let version = version.into();
        Ok(Self {
            project_name: project_name.into(),
            development_version: version.clone(),
            version,
            source,
            target_directory,
            archive_extension: "zip".to_string(),
            locale: None,
            is_development_build: false,
            force: false,
            excluded_file_names: HashSet::new(),
            writable_relative_dirs: Vec::new(),
        })
    }

    /// The version actually downloaded, honouring the development flag
    pub fn effective_version(&self) -> &str {
        if self.is_development_build {
            &self.development_version
        } else {
            &self.version
        }
    }

    /// Full archive URL for URL-sourced requests
    pub fn archive_url(&self) -> Option<String> {
        match &self.source {
            RequestSource::Url(base) => Some(format!(
                "{}/{}.{}",
                base.trim_end_matches('/'),
                self.effective_version(),
                self.archive_extension
            )),
            RequestSource::Command(_) => None,
        }
    }

    /// Writable directories resolved against the target
    pub fn writable_dirs(&self) -> Vec<PathBuf> {
        self.writable_relative_dirs
            .iter()
            .map(|dir| self.target_directory.join(dir))
            .collect()
    }
}
