//! Sequencing of project plans followed by the dependency-manager bootstrap.

use crate::env::Environment;
use crate::error::{InstallError, InstallResult};
use crate::models::{DownloadRequest, RequestSource};
use crate::plan::{PlanRunner, Toolkit};
use crate::runner::{BinaryFallback, ShellCommand, locate_binary};

pub const BANNER: &str = "Application ready! Build something amazing.";

/// Composer scripts run after the projects are in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub binary_name: String,
    pub phar_name: String,
    /// Manifest whose presence in the skeleton triggers the bootstrap
    pub manifest: String,
    pub commands: Vec<String>,
    pub no_ansi: bool,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            binary_name: "composer".to_string(),
            phar_name: "composer.phar".to_string(),
            manifest: "composer.json".to_string(),
            commands: vec![
                "update --no-scripts".to_string(),
                "run-script post-root-package-install".to_string(),
                "run-script post-autoload-dump".to_string(),
            ],
            no_ansi: false,
        }
    }
}

impl Bootstrap {
    /// All commands chained with `&&` so the first failure stops the rest
    pub fn command_line(&self, env: &dyn Environment) -> String {
        let binary = locate_binary(
            env,
            &self.binary_name,
            Some(self.phar_name.as_str()),
            BinaryFallback::Bare,
        );
        let suffix = if self.no_ansi { " --no-ansi" } else { "" };

        self.commands
            .iter()
            .map(|command| format!("{binary} {command}{suffix}"))
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// Runs the skeleton and payload plans in order, then the bootstrap
pub struct InstallOrchestrator<'a> {
    tools: Toolkit<'a>,
    bootstrap: Bootstrap,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(tools: Toolkit<'a>, bootstrap: Bootstrap) -> Self {
        Self { tools, bootstrap }
    }

    /// Every archive format the plans will need must be extractable
    /// before anything is downloaded.
    pub fn check_codecs(&self, requests: &[DownloadRequest]) -> InstallResult<()> {
        for request in requests {
            if matches!(request.source, RequestSource::Url(_))
                && !self.tools.extractor.supports(&request.archive_extension)
            {
                return Err(InstallError::MissingCodec {
                    extension: request.archive_extension.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run `requests` through `plans`, stopping at the first non-zero exit.
    ///
    /// The first request is the skeleton; the bootstrap runs inside its
    /// target when the manifest is present there. The banner is printed only
    /// when every step succeeded.
    pub fn run(&self, plans: &dyn PlanRunner, requests: &[DownloadRequest]) -> InstallResult<i32> {
        let skeleton = requests
            .first()
            .ok_or_else(|| InstallError::InvalidRequest("nothing to install".to_string()))?;

        self.check_codecs(requests)?;

        for request in requests {
            let code = plans.run(request)?;
            if code != 0 {
                log::warn!("{} failed with exit code {code}", request.project_name);
                return Ok(code);
            }
        }

        let root = &skeleton.target_directory;
        if self.tools.env.exists(&root.join(&self.bootstrap.manifest)) {
            let command = ShellCommand {
                line: self.bootstrap.command_line(self.tools.env),
                working_dir: root.clone(),
                interactive: self.tools.env.has_tty(),
            };

            log::info!("Running {}", command.line);
            let reporter = self.tools.reporter;
            let code = self
                .tools
                .runner
                .run(&command, &mut |line| reporter.line(line))?;
            if code != 0 {
                log::warn!("Bootstrap failed with exit code {code}");
                return Ok(code);
            }
        } else {
            log::debug!(
                "No {} in {}, skipping bootstrap",
                self.bootstrap.manifest,
                root.display()
            );
        }

        self.tools.reporter.comment(BANNER);
        Ok(0)
    }
}
