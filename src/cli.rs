use crate::archive::ArchiveCodec;
use crate::config::SetupConfig;
use crate::download::http::HttpFetcher;
use crate::env::{Environment, SystemEnvironment};
use crate::models::{Args, Commands, InstallOptions};
use crate::orchestrator::{Bootstrap, InstallOrchestrator};
use crate::plan::{InstallationPlan, Toolkit};
use crate::runner::SystemProcessRunner;
use crate::ui::ConsoleReporter;
use anyhow::{Context, Result};
use std::path::Path;

/// Main CLI entry point; returns the process exit code
pub fn run(args: Args) -> Result<i32> {
    match args.command {
        Commands::Install {
            name,
            locale,
            skip,
            skip_content,
            dev,
            force,
            no_ansi,
        } => {
            let options = InstallOptions {
                name,
                locale,
                skip,
                skip_content,
                dev,
                force,
                no_ansi,
            };
            install(args.config.as_deref(), &options)
        }
    }
}

/// Install the skeleton and payload into the directory named by `options`
pub fn install(config_path: Option<&Path>, options: &InstallOptions) -> Result<i32> {
    let config = SetupConfig::load(config_path)?;
    let env = SystemEnvironment::new().context("Failed to determine the working directory")?;
    let requests = config.requests(options, env.current_dir())?;

    for request in &requests {
        log::debug!(
            "{} -> {} (version {})",
            request.project_name,
            request.target_directory.display(),
            request.effective_version()
        );
    }

    let fetcher = HttpFetcher::new();
    let tools = Toolkit {
        env: &env,
        fetcher: &fetcher,
        extractor: &ArchiveCodec,
        runner: &SystemProcessRunner,
        reporter: &ConsoleReporter,
    };
    let bootstrap = Bootstrap {
        no_ansi: options.no_ansi,
        ..Bootstrap::default()
    };

    let plan = InstallationPlan::new(tools);
    let code = InstallOrchestrator::new(tools, bootstrap).run(&plan, &requests)?;
    Ok(code)
}
