use crate::error::DaemonStateError;

/// Print an error that ended a command.
/// Daemon state errors are meant for the user and printed as-is, everything else is logged with its full chain.
pub fn print_error(err: &anyhow::Error) {
    match err.downcast_ref::<DaemonStateError>() {
        Some(_) => eprintln!("{}", format_error(err)),
        None => log::error!("{}", format_error(err)),
    }
}

pub fn format_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DaemonStateError>() {
        Some(err) => err.to_string(),
        None => format!("{:?}", err),
    }
}
