use std::process::Stdio;

/// Launch a shell command in its own session with its stdio detached from the daemon, without waiting for it.
///
/// The child does not share the daemon's process group, so it survives the daemon being killed.
/// Dropping the returned handle does not kill it; tokio reaps it once it exits.
pub fn spawn_detached(command: &str) -> std::io::Result<tokio::process::Child> {
    log::debug!("Launching `{}`", command);
    let mut cmd = tokio::process::Command::new("/bin/sh");
    cmd.arg("-c").arg(command).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    unsafe {
        cmd.pre_exec(|| {
            let _ = nix::unistd::setsid();
            Ok(())
        });
    }
    cmd.spawn()
}
