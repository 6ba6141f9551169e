use anyhow::{Context, Result};
use clap::CommandFactory as _;

use crate::{config::BarConfig, opts::Action, paths::CyanbarPaths};

mod application_lifecycle;
mod bar;
mod client;
mod config;
mod control;
mod error;
mod error_handling_ctx;
mod heartbeat;
mod launcher;
mod lock;
mod opts;
mod paths;
mod process;
mod providers;
mod registry;
mod render;
mod server;
mod sink;
mod util;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder().filter(Some("cyanbar"), log_level_filter).init();
    }

    if let Action::ShellCompletions { shell } = opts.action {
        clap_complete::generate(shell, &mut opts::RawOpt::command(), "cyanbar", &mut std::io::stdout());
        return;
    }

    if let Err(err) = run(opts) {
        error_handling_ctx::print_error(&err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    let paths = match opts.state_dir {
        Some(state_dir) => CyanbarPaths::from_state_dir(state_dir, opts.config_path),
        None => CyanbarPaths::default(opts.config_path),
    }
    .context("Failed to initialize cyanbar paths")?;
    log::debug!("Using paths: {}", paths);

    match opts.action {
        Action::ShellCompletions { .. } => unreachable!(),
        Action::Run => {
            let config = BarConfig::read_or_default(paths.get_config_file());
            server::initialize_server(paths, config, opts.detach)?;
        }
        Action::Kill => client::kill_daemon(&paths)?,
        Action::Update(names) => client::send_update(&paths, &names)?,
    }
    Ok(())
}
