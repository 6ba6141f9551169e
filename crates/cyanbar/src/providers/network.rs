use std::time::Duration;

use super::run_command;
use crate::error::ProviderError;

pub fn glyph(link_status: &str) -> &'static str {
    if link_status.trim() == "Not connected." {
        "\u{f127}"
    } else {
        "\u{f1eb}"
    }
}

/// Wifi link state of `interface`, as reported by `iw`.
pub fn render(interface: &str, timeout: Duration) -> Result<String, ProviderError> {
    let status = run_command("iw", &[interface, "link"], timeout)?;
    Ok(glyph(&status).to_string())
}
