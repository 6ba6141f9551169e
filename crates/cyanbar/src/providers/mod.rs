//! The fixed set of providers the bar shows, and the helpers they share.

use std::{
    io::Read,
    process::{Command, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};

use itertools::Itertools;
use wait_timeout::ChildExt;

use crate::{
    config::BarConfig,
    error::{ProviderError, RegistryError},
    registry::{CacheSlot, Registry},
};

pub mod apps;
pub mod backlight;
pub mod battery;
pub mod clock;
pub mod network;
pub mod volume;

pub const APPS: &str = "apps";
pub const CLOCK: &str = "clock";
pub const BATTERY: &str = "battery";
pub const BRIGHTNESS: &str = "brightness";
pub const VOLUME: &str = "volume";
pub const NETWORK: &str = "network";

/// Run a program and return its stdout, killing it if it takes longer than `timeout`.
pub fn run_command(program: &str, args: &[&str], timeout: Duration) -> Result<String, ProviderError> {
    let command = || std::iter::once(program).chain(args.iter().copied()).join(" ");
    log::trace!("Running command: {}", command());

    let started = Instant::now();
    let mut child = Command::new(program).args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::null()).spawn()?;
    let mut stdout = child.stdout.take().ok_or_else(|| ProviderError::Unavailable(format!("stdout of `{}`", command())))?;
    // read concurrently, so a chatty child can't block on a full pipe while we wait for it
    let (output_send, output_recv) = mpsc::channel();
    std::thread::spawn(move || {
        let mut output = Vec::new();
        let _ = output_send.send(stdout.read_to_end(&mut output).map(|_| output));
    });

    match child.wait_timeout(timeout)? {
        Some(status) if status.success() => {
            // a background process may have inherited the pipe, don't wait for it past the deadline
            match output_recv.recv_timeout(timeout.saturating_sub(started.elapsed())) {
                Ok(output) => Ok(String::from_utf8_lossy(&output?).into_owned()),
                Err(RecvTimeoutError::Timeout) => Err(ProviderError::Timeout { command: command(), timeout }),
                Err(RecvTimeoutError::Disconnected) => Err(ProviderError::Unavailable(format!("output of `{}`", command()))),
            }
        }
        Some(status) => Err(ProviderError::CommandFailed { command: command(), status }),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Err(ProviderError::Timeout { command: command(), timeout })
        }
    }
}

/// Register every built-in provider with the given registry.
pub fn register_defaults(registry: &Registry, config: &BarConfig) -> Result<(), RegistryError> {
    let policy = config.failure_policy();
    let timeout = config.provider_timeout;
    let half_spacing = crate::util::half_spacing(&config.spacing).to_string();

    let backlight_dir = config.backlight_dir.clone();
    let power_supply_dir = config.power_supply_dir.clone();
    let wifi_interface = config.wifi_interface.clone();

    let slots = vec![
        CacheSlot::new(APPS, move || apps::render(&half_spacing, timeout)),
        CacheSlot::new(CLOCK, || Ok(clock::render(&chrono::Local::now()))),
        CacheSlot::new(NETWORK, move || network::render(&wifi_interface, timeout)),
        CacheSlot::new(VOLUME, move || volume::render(timeout)),
        CacheSlot::new(BRIGHTNESS, move || backlight::render(&backlight_dir)),
        CacheSlot::new(BATTERY, move || battery::render(&power_supply_dir)),
    ];
    for slot in slots {
        registry.register(slot.with_failure_policy(policy.clone()))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_run_command_output() {
        let output = run_command("echo", &["hello", "world"], Duration::from_secs(5)).unwrap();
        assert_eq!(output, "hello world\n");
    }

    #[test]
    fn test_run_command_failure() {
        let result = run_command("false", &[], Duration::from_secs(5));
        assert!(matches!(result, Err(ProviderError::CommandFailed { .. })));
        let result = run_command("definitely-not-a-cyanbar-command", &[], Duration::from_secs(5));
        assert!(matches!(result, Err(ProviderError::Io(_))));
    }

    #[test]
    fn test_run_command_timeout() {
        let started = std::time::Instant::now();
        let result = run_command("sleep", &["10"], Duration::from_millis(100));
        assert!(matches!(result, Err(ProviderError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_run_command_does_not_wait_for_inherited_output() {
        let started = std::time::Instant::now();
        let result = run_command("sh", &["-c", "sleep 10 & echo started"], Duration::from_millis(200));
        assert!(matches!(result, Err(ProviderError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_register_defaults() {
        let registry = Registry::new();
        register_defaults(&registry, &BarConfig::default()).unwrap();
        let mut names = registry.names().into_iter().map(|name| name.0).collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["apps", "battery", "brightness", "clock", "network", "volume"]);
        assert!(register_defaults(&registry, &BarConfig::default()).is_err());
    }
}
