use std::{os::unix::io::AsRawFd, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use crate::{
    application_lifecycle::TaskGroup,
    bar::Bar,
    config::BarConfig,
    control::{self, ControlReader},
    error::DaemonStateError,
    heartbeat,
    launcher::{self, focus::Xdotool, input::XinputKeySource, Launcher, LauncherHandle, SharedState},
    lock::{self, InstanceLock},
    paths::CyanbarPaths,
    process, providers,
    registry::Registry,
    render::Layout,
    sink::LemonbarProcess,
};

pub fn initialize_server(paths: CyanbarPaths, config: BarConfig, should_detach: bool) -> Result<ForkResult> {
    // check before forking, so the error still reaches the terminal
    if lock::is_locked(paths.get_lock_file())? {
        return Err(DaemonStateError::AlreadyRunning.into());
    }

    if should_detach {
        let fork_result = do_detach(paths.get_log_dir(), paths.get_log_file())?;
        if fork_result == ForkResult::Parent {
            return Ok(ForkResult::Parent);
        }
    }

    // the lock belongs to the process that ends up running the bar, so it is only taken after forking
    let Some(instance_lock) = InstanceLock::acquire(paths.get_lock_file(), paths.get_pid_file())? else {
        return Err(DaemonStateError::AlreadyRunning.into());
    };
    log::info!("Initializing cyanbar daemon ({})", paths);

    let exit = CancellationToken::new();
    {
        let exit = exit.clone();
        simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], move |_| {
            log::info!("Shutting down cyanbar daemon...");
            exit.cancel();
        });
    }

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    let result = rt.block_on(run_daemon(&paths, config, exit));
    // don't wait forever on a provider that hangs in a blocking task
    rt.shutdown_timeout(Duration::from_secs(1));
    drop(instance_lock);
    log::info!("cyanbar daemon stopped");
    result.map(|()| ForkResult::Child)
}

/// Run the bar until `exit` is cancelled or the bar process goes away.
pub async fn run_daemon(paths: &CyanbarPaths, config: BarConfig, exit: CancellationToken) -> Result<()> {
    let control = ControlReader::create(paths.get_control_file())?;
    let registry = Arc::new(Registry::new());
    providers::register_defaults(&registry, &config)?;
    let launcher_state = SharedState::default();
    registry.register(launcher::slot(launcher_state.clone()))?;
    log::debug!("Registered slots: {:?}", registry.names());

    // started last, nothing fallible may run between spawning the bar and handing it to the tasks
    let (lemonbar, mut actions) = LemonbarProcess::spawn(&config.sink_command, config.sink_timeout)?;
    let lemonbar = Arc::new(lemonbar);

    let bar = Bar::new(registry, lemonbar.clone(), Layout::new(config.spacing.clone()), exit.clone());
    let (launcher_handle, activations) = LauncherHandle::new();
    let launcher = Launcher::new(
        bar.clone(),
        launcher_state,
        Arc::new(XinputKeySource::new(config.keyboard_device.clone())),
        Arc::new(Xdotool::new(config.bar_class.clone(), config.provider_timeout)),
        config.launcher_grace,
    );

    let mut tasks = TaskGroup::new(exit.clone());
    {
        let bar = bar.clone();
        let interval = config.heartbeat_interval;
        tasks.spawn("heartbeat", move |token| heartbeat::run(bar, interval, token));
    }
    {
        let bar = bar.clone();
        let poll_interval = config.control_poll_interval;
        tasks.spawn("control-listener", move |token| control::run(bar, control, poll_interval, Some(launcher_handle), token));
    }
    tasks.spawn("launcher", move |token| launcher.run(activations, token));

    run_actions(&bar, &mut actions, config.action_timeout, &exit).await;

    log::debug!("Stopping tasks");
    exit.cancel();
    tasks.shutdown().await;
    lemonbar.terminate().await;
    Ok(())
}

/// Run the commands the bar prints when it is clicked, until the bar closes its output.
async fn run_actions(bar: &Bar, actions: &mut UnboundedReceiver<String>, timeout: Duration, exit: &CancellationToken) {
    crate::loop_select_cancellable!(exit,
        action = actions.recv() => match action {
            Some(action) => run_action(bar, action.trim(), timeout).await,
            None => {
                log::info!("The bar closed its output, shutting down");
                break;
            }
        }
    );
}

async fn run_action(bar: &Bar, action: &str, timeout: Duration) {
    if action.is_empty() {
        return;
    }
    log::debug!("Running click action `{}`", action);
    match process::spawn_detached(action) {
        Ok(mut child) => match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) if !status.success() => log::warn!("`{}` exited with {}", action, status),
            Ok(Ok(_)) => {}
            Ok(Err(err)) => log::error!("Failed to wait for `{}`: {}", action, err),
            Err(_) => log::warn!("`{}` still running after {:?}, not waiting for it", action, timeout),
        },
        Err(err) => log::error!("Failed to run `{}`: {}", action, err),
    }
    // the action most likely changed the window list
    if let Err(err) = bar.refresh(providers::APPS.into()).await {
        log::debug!("Not refreshing the window list: {}", err);
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ForkResult {
    Parent,
    Child,
}

/// detach the process from the terminal, also redirecting stdout and stderr to the log file
fn do_detach(log_dir: &Path, log_file_path: &Path) -> Result<ForkResult> {
    // detach from terminal
    match unsafe { nix::unistd::fork()? } {
        nix::unistd::ForkResult::Child => {
            nix::unistd::setsid()?;
            match unsafe { nix::unistd::fork()? } {
                nix::unistd::ForkResult::Parent { .. } => std::process::exit(0),
                nix::unistd::ForkResult::Child => {}
            }
        }
        nix::unistd::ForkResult::Parent { .. } => {
            return Ok(ForkResult::Parent);
        }
    }

    std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("Error opening log file ({}), for writing", log_file_path.display()))?;
    let fd = file.as_raw_fd();

    if nix::unistd::isatty(1)? {
        nix::unistd::dup2(fd, std::io::stdout().as_raw_fd())?;
    }
    if nix::unistd::isatty(2)? {
        nix::unistd::dup2(fd, std::io::stderr().as_raw_fd())?;
    }

    Ok(ForkResult::Child)
}
