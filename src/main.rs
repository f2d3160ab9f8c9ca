use clap::Parser;
use ggwp::models::{Args, Commands};
use ggwp::{cli, ui};

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if args.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let Commands::Install { no_ansi, .. } = &args.command;
    if *no_ansi {
        ui::disable_colors();
    }

    let code = match cli::run(args) {
        Ok(code) => code,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            1
        }
    };

    std::process::exit(code);
}
