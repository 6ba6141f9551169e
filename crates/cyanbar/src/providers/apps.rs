//! The task list: one clickable icon per normal window.

use std::time::Duration;

use cyanbar_shared_util::markup::{self, MouseButton};
use itertools::Itertools;

use super::run_command;
use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Decimal X window id, as `xdotool` prints it.
    pub id: String,
    pub class: String,
}

/// Parse the output of `wmctrl -xl`, skipping windows that are on no desktop (docks, bars).
pub fn parse_windows(output: &str) -> Vec<Window> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let (id, desktop, wm_class) = (fields.next()?, fields.next()?, fields.next()?);
            if desktop == "-1" {
                return None;
            }
            let id = u64::from_str_radix(id.trim_start_matches("0x"), 16).ok()?;
            let class = wm_class.split('.').nth(1)?;
            Some(Window { id: id.to_string(), class: class.to_string() })
        })
        .sorted_by(|a, b| a.class.cmp(&b.class).then_with(|| a.id.cmp(&b.id)))
        .collect()
}

pub fn icon(class: &str) -> String {
    match class {
        "Lilyterm" | "URxvt" => "\u{f120}".to_string(),
        "Firefox" => "\u{f269}".to_string(),
        "Emacs" => "\u{f121}".to_string(),
        _ => class.chars().next().map(|c| markup::escape(&c.to_string())).unwrap_or_default(),
    }
}

pub fn render_windows(windows: &[Window], active: Option<&str>, half_spacing: &str) -> String {
    let entries = windows.iter().map(|window| {
        let content = format!("{}{}{}", half_spacing, icon(&window.class), half_spacing);
        let minimize = markup::clickable(MouseButton::Right, &format!("xdotool windowminimize {}", window.id), &content);
        let entry = markup::clickable(MouseButton::Left, &format!("xdotool windowactivate {}", window.id), &minimize);
        if active == Some(window.id.as_str()) {
            markup::reversed(&entry)
        } else {
            entry
        }
    });
    std::iter::once(half_spacing.to_string()).chain(entries).collect()
}

pub fn render(half_spacing: &str, timeout: Duration) -> Result<String, ProviderError> {
    let windows = parse_windows(&run_command("wmctrl", &["-xl"], timeout)?);
    // with no window focused, xdotool fails
    let active = run_command("xdotool", &["getactivewindow"], timeout).ok();
    let active = active.as_deref().map(str::trim).filter(|id| !id.is_empty());
    Ok(render_windows(&windows, active, half_spacing))
}
