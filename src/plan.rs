//! One project install: verify, acquire, merge, repair, clean up.

use crate::archive::ArchiveExtractor;
use crate::download::{ArchiveFetcher, download_to};
use crate::env::Environment;
use crate::error::{InstallError, InstallResult};
use crate::merge::merge_tree;
use crate::models::{DownloadRequest, ExternalCommandSpec, RequestSource};
use crate::permissions::repair_permissions;
use crate::runner::{ProcessRunner, ShellCommand, command_line};
use crate::ui::Reporter;
use crate::utils::{make_temp_name, title_case};
use std::fs;
use std::path::Path;

/// The capabilities a plan runs against
#[derive(Clone, Copy)]
pub struct Toolkit<'a> {
    pub env: &'a dyn Environment,
    pub fetcher: &'a dyn ArchiveFetcher,
    pub extractor: &'a dyn ArchiveExtractor,
    pub runner: &'a dyn ProcessRunner,
    pub reporter: &'a dyn Reporter,
}

/// Something that can install one project request
pub trait PlanRunner {
    /// Returns the exit code of the install (0 on success)
    fn run(&self, request: &DownloadRequest) -> InstallResult<i32>;
}

/// The download → extract → merge → repair → cleanup pipeline, driven
/// entirely by the request's data
pub struct InstallationPlan<'a> {
    tools: Toolkit<'a>,
}

impl<'a> InstallationPlan<'a> {
    pub fn new(tools: Toolkit<'a>) -> Self {
        Self { tools }
    }

    /// Refuse to install over an existing target unless forced.
    ///
    /// Installing into the working directory itself is always allowed.
    pub fn verify(&self, request: &DownloadRequest) -> InstallResult<()> {
        let target = &request.target_directory;
        if !request.force
            && self.tools.env.exists(target)
            && target.as_path() != self.tools.env.current_dir()
        {
            return Err(InstallError::AlreadyExists {
                target: target.clone(),
            });
        }
        Ok(())
    }

    fn download_by_url(&self, request: &DownloadRequest) -> InstallResult<i32> {
        let extension = &request.archive_extension;
        if !self.tools.extractor.supports(extension) {
            return Err(InstallError::MissingCodec {
                extension: extension.clone(),
            });
        }

        let url = request.archive_url().ok_or_else(|| {
            InstallError::InvalidRequest(format!("{} has no source url", request.project_name))
        })?;

        let temp_name = make_temp_name(&request.project_name);
        let cwd = self.tools.env.current_dir();
        let temp_dir = cwd.join(&temp_name);
        let archive = cwd.join(format!("{temp_name}.{extension}"));

        download_to(self.tools.fetcher, &url, &archive)?;

        if let Err(e) = self.tools.extractor.extract(&archive, &temp_dir) {
            remove_quietly(&archive);
            let _ = fs::remove_dir_all(&temp_dir);
            return Err(e);
        }

        merge_tree(&temp_dir, &request.target_directory, &request.excluded_file_names)?;

        let failed = repair_permissions(&request.writable_dirs(), self.tools.reporter);
        if !failed.is_empty() {
            log::debug!("{} writable directories left unchanged", failed.len());
        }

        remove_quietly(&archive);
        Ok(0)
    }

    fn download_by_command(
        &self,
        request: &DownloadRequest,
        spec: &ExternalCommandSpec,
    ) -> InstallResult<i32> {
        let target = &request.target_directory;
        fs::create_dir_all(target).map_err(|e| InstallError::io(target, e))?;

        let command = ShellCommand {
            line: command_line(self.tools.env, spec),
            working_dir: target.clone(),
            interactive: self.tools.env.has_tty(),
        };

        log::info!("Running {}", command.line);
        let reporter = self.tools.reporter;
        self.tools
            .runner
            .run(&command, &mut |line| reporter.line(line))
    }
}

impl PlanRunner for InstallationPlan<'_> {
    fn run(&self, request: &DownloadRequest) -> InstallResult<i32> {
        self.verify(request)?;

        let title = title_case(&request.project_name);
        self.tools
            .reporter
            .info(&format!("Initialize the {title} project app."));

        let code = match &request.source {
            RequestSource::Url(_) => self.download_by_url(request)?,
            RequestSource::Command(spec) => self.download_by_command(request, spec)?,
        };

        if code == 0 {
            self.tools
                .reporter
                .info(&format!("{title} has been successfully initialized."));
        } else {
            log::warn!("{title} install exited with code {code}");
        }

        Ok(code)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        log::debug!("Could not remove {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveCodec;
    use crate::models::ArgumentMap;
    use crate::testing::{
        FakeEnvironment, FixtureFetcher, RecordingReporter, ScriptedProcessRunner, zip_fixture,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Harness {
        env: FakeEnvironment,
        fetcher: FixtureFetcher,
        runner: ScriptedProcessRunner,
        reporter: RecordingReporter,
    }

    impl Harness {
        fn new(env: FakeEnvironment, fetcher: FixtureFetcher) -> Self {
            Self {
                env,
                fetcher,
                runner: ScriptedProcessRunner::new(0, &[]),
                reporter: RecordingReporter::default(),
            }
        }

        fn with_runner(mut self, runner: ScriptedProcessRunner) -> Self {
            self.runner = runner;
            self
        }

        fn run(&self, request: &DownloadRequest) -> InstallResult<i32> {
            let tools = Toolkit {
                env: &self.env,
                fetcher: &self.fetcher,
                extractor: &ArchiveCodec,
                runner: &self.runner,
                reporter: &self.reporter,
            };
            InstallationPlan::new(tools).run(request)
        }
    }

    fn demo_request(target: PathBuf) -> DownloadRequest {
        let mut request = DownloadRequest::new(
            "demo",
            "latest",
            RequestSource::Url("https://example.test/demo".to_string()),
            target,
        )
        .unwrap();
        request.excluded_file_names.insert("notes.txt".to_string());
        request.writable_relative_dirs.push("cache".to_string());
        request
    }

    fn command_request(target: PathBuf) -> DownloadRequest {
        let args = ArgumentMap::new()
            .with("--path", target.to_string_lossy().to_string())
            .with("--locale", "id_ID")
            .with("--force", false);
        let spec =
            ExternalCommandSpec::parse("wp core download", args, Some("wp-cli.phar".to_string()))
                .unwrap();
        DownloadRequest::new("wordpress", "latest", RequestSource::Command(spec), target).unwrap()
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_end_to_end_demo_archive() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        let fixture = zip_fixture(&[("app.txt", "app"), ("notes.txt", "notes"), ("cache/", "")]);
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(fixture),
        );

        let code = harness.run(&demo_request(target.clone())).unwrap();

        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(target.join("app.txt")).unwrap(), "app");
        assert!(!target.join("notes.txt").exists());
        assert!(target.join("cache").is_dir());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(target.join("cache")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        // Only the target is left in the working directory: no archive, no temp dir
        assert_eq!(entries(temp.path()), vec!["out"]);
        assert_eq!(harness.fetcher.urls(), vec!["https://example.test/demo/latest.zip"]);
        assert_eq!(
            harness.reporter.infos(),
            vec![
                "Initialize the Demo project app.",
                "Demo has been successfully initialized."
            ]
        );
    }

    #[test]
    fn test_development_build_fetches_development_version() {
        let temp = TempDir::new().unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(zip_fixture(&[("app.txt", "app")])),
        );
        let mut request = demo_request(temp.path().join("out"));
        request.development_version = "latest-develop".to_string();
        request.is_development_build = true;

        harness.run(&request).unwrap();

        assert_eq!(
            harness.fetcher.urls(),
            vec!["https://example.test/demo/latest-develop.zip"]
        );
    }

    #[test]
    fn test_existing_target_fails_before_any_write() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        fs::create_dir(&target).unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(zip_fixture(&[("app.txt", "app")])),
        );

        let err = harness.run(&demo_request(target.clone())).unwrap_err();

        assert!(matches!(err, InstallError::AlreadyExists { .. }));
        assert_eq!(err.to_string(), "Application already exists!");
        assert!(harness.fetcher.urls().is_empty());
        assert!(harness.reporter.infos().is_empty());
        assert!(entries(&target).is_empty());
        assert_eq!(entries(temp.path()), vec!["out"]);
    }

    #[test]
    fn test_existing_file_target_also_fails() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        fs::write(&target, "not a directory").unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(Vec::new()),
        );

        let err = harness.run(&demo_request(target)).unwrap_err();
        assert!(matches!(err, InstallError::AlreadyExists { .. }));
    }

    #[test]
    fn test_force_installs_over_existing_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("app.txt"), "old").unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(zip_fixture(&[("app.txt", "new")])),
        );
        let mut request = demo_request(target.clone());
        request.force = true;

        assert_eq!(harness.run(&request).unwrap(), 0);
        assert_eq!(fs::read_to_string(target.join("app.txt")).unwrap(), "new");
    }

    #[test]
    fn test_installing_into_working_directory_is_allowed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("README"), "existing").unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(zip_fixture(&[("app.txt", "app")])),
        );

        let code = harness.run(&demo_request(temp.path().to_path_buf())).unwrap();

        assert_eq!(code, 0);
        assert!(temp.path().join("app.txt").exists());
        assert!(temp.path().join("README").exists());
    }

    #[test]
    fn test_fetch_failure_aborts_plan() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::failing(404),
        );

        let err = harness.run(&demo_request(target.clone())).unwrap_err();

        assert!(matches!(err, InstallError::Fetch { status: Some(404), .. }));
        assert!(!target.exists());
        assert_eq!(harness.reporter.infos(), vec!["Initialize the Demo project app."]);
    }

    #[test]
    fn test_corrupt_archive_aborts_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(b"not a zip".to_vec()),
        );

        let err = harness.run(&demo_request(target.clone())).unwrap_err();

        assert!(matches!(err, InstallError::Extract { .. }));
        assert!(!target.exists());
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn test_unsupported_extension_is_missing_codec() {
        let temp = TempDir::new().unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(Vec::new()),
        );
        let mut request = demo_request(temp.path().join("out"));
        request.archive_extension = "rar".to_string();

        let err = harness.run(&request).unwrap_err();

        assert!(matches!(err, InstallError::MissingCodec { .. }));
        assert!(harness.fetcher.urls().is_empty());
    }

    #[test]
    fn test_missing_writable_dir_only_warns() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(zip_fixture(&[("app.txt", "app"), ("cache/", "")])),
        );
        let mut request = demo_request(target.clone());
        request.writable_relative_dirs = vec!["storage".to_string(), "cache".to_string()];

        let code = harness.run(&request).unwrap();

        assert_eq!(code, 0);
        let comments = harness.reporter.comments();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].contains(&target.join("storage").display().to_string()));
        assert!(target.join("app.txt").exists());
    }

    #[test]
    fn test_command_plan_runs_in_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out").join("system");
        let env = FakeEnvironment::on_disk(temp.path())
            .with_executable("wp", "/usr/bin/wp")
            .with_tty(true);
        let harness = Harness::new(env, FixtureFetcher::new(Vec::new()))
            .with_runner(ScriptedProcessRunner::new(0, &["Downloading WordPress", "Success"]));

        let code = harness.run(&command_request(target.clone())).unwrap();

        assert_eq!(code, 0);
        assert!(target.is_dir());
        let commands = harness.runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].working_dir, target);
        assert!(commands[0].interactive);
        assert!(commands[0].line.starts_with("wp core download --path="));
        assert!(commands[0].line.ends_with("--locale=id_ID"));
        assert_eq!(harness.reporter.lines(), vec!["Downloading WordPress", "Success"]);
        assert!(harness.fetcher.urls().is_empty());
    }

    #[test]
    fn test_command_plan_propagates_exit_code() {
        let temp = TempDir::new().unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(Vec::new()),
        )
        .with_runner(ScriptedProcessRunner::new(2, &["Error: download failed"]));

        let code = harness.run(&command_request(temp.path().join("wp"))).unwrap();

        assert_eq!(code, 2);
        assert_eq!(
            harness.reporter.infos(),
            vec!["Initialize the Wordpress project app."]
        );
    }

    #[test]
    fn test_command_plan_respects_precondition() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("wp");
        fs::create_dir(&target).unwrap();
        let harness = Harness::new(
            FakeEnvironment::on_disk(temp.path()),
            FixtureFetcher::new(Vec::new()),
        );

        let err = harness.run(&command_request(target)).unwrap_err();

        assert!(err.is_precondition());
        assert!(harness.runner.commands().is_empty());
    }
}
