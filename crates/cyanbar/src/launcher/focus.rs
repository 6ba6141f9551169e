use std::time::Duration;

use crate::providers::run_command;

/// Moves the keyboard focus between the bar and the user's windows.
pub trait FocusControl: Send + Sync {
    /// The currently focused window, if any.
    fn active_window(&self) -> Option<String>;
    /// Give the input focus to the bar.
    fn focus_bar(&self);
    /// Give the input focus back to a window recorded with [`FocusControl::active_window`].
    fn restore(&self, window: &str);
}

/// Focus control through `xdotool`.
#[derive(Debug, Clone)]
pub struct Xdotool {
    bar_class: String,
    timeout: Duration,
}

impl Xdotool {
    pub fn new(bar_class: impl Into<String>, timeout: Duration) -> Self {
        Xdotool { bar_class: bar_class.into(), timeout }
    }
}

impl FocusControl for Xdotool {
    fn active_window(&self) -> Option<String> {
        run_command("xdotool", &["getactivewindow"], self.timeout)
            .map(|out| out.trim().to_string())
            .ok()
            .filter(|id| !id.is_empty())
    }

    fn focus_bar(&self) {
        crate::print_result_err!(
            "while focusing the bar",
            run_command("xdotool", &["search", "--class", &self.bar_class, "windowfocus"], self.timeout)
        );
    }

    fn restore(&self, window: &str) {
        crate::print_result_err!(
            "while restoring the focus",
            run_command("xdotool", &["windowactivate", window], self.timeout)
        );
    }
}
