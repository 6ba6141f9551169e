use cyanbar_shared_util::markup::Alignment;

use crate::{launcher, providers, registry::Registry};

/// The fixed layout of the bar: window list and launcher on the left, the clock centered,
/// and the system indicators on the right, separated by a spacer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    spacing: String,
}

impl Layout {
    pub fn new(spacing: impl Into<String>) -> Self {
        Layout { spacing: spacing.into() }
    }

    /// Render every slot into one bar line, without the trailing newline.
    /// Missing or hidden slots render as empty strings.
    pub fn render_all(&self, registry: &Registry) -> String {
        let s = &self.spacing;
        format!(
            "{left}{s}{apps}{launcher}{center}{clock}{right}{network}{s}{volume}{s}{brightness}{s}{battery}{s}",
            left = Alignment::Left,
            center = Alignment::Center,
            right = Alignment::Right,
            apps = registry.render(providers::APPS),
            launcher = registry.render(launcher::LAUNCHER),
            clock = registry.render(providers::CLOCK),
            network = registry.render(providers::NETWORK),
            volume = registry.render(providers::VOLUME),
            brightness = registry.render(providers::BRIGHTNESS),
            battery = registry.render(providers::BATTERY),
        )
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(" ".repeat(10))
    }
}
