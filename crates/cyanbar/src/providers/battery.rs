use std::path::Path;

use crate::error::ProviderError;

const PLUG: char = '\u{f1e6}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub percent: u8,
    pub charging: bool,
}

impl BatteryStatus {
    /// Parse the `capacity` and `status` attributes of a power supply.
    pub fn parse(capacity: &str, status: &str) -> Result<Self, ProviderError> {
        let status = status.trim();
        let percent = if status == "Full" {
            100
        } else {
            let capacity = capacity.trim();
            capacity.parse::<u8>().map_err(|_| ProviderError::Parse(format!("battery capacity `{}`", capacity)))?.min(100)
        };
        Ok(BatteryStatus { percent, charging: status != "Discharging" })
    }

    pub fn glyph(&self) -> String {
        let level = match self.percent {
            0..=24 => format!("\u{f244} ({}%)", self.percent),
            25..=49 => "\u{f243}".to_string(),
            50..=74 => "\u{f242}".to_string(),
            75..=94 => "\u{f241}".to_string(),
            _ => "\u{f240}".to_string(),
        };
        if self.charging {
            format!("{} {}", PLUG, level)
        } else {
            level
        }
    }
}

/// The first `BAT*` entry of the power supply class directory.
fn find_battery(power_supply_dir: &Path) -> Result<std::path::PathBuf, ProviderError> {
    let mut batteries = std::fs::read_dir(power_supply_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.starts_with("BAT")))
        .collect::<Vec<_>>();
    batteries.sort();
    batteries.into_iter().next().ok_or_else(|| ProviderError::Unavailable(format!("a battery in {}", power_supply_dir.display())))
}

pub fn render(power_supply_dir: &Path) -> Result<String, ProviderError> {
    let battery = find_battery(power_supply_dir)?;
    let status = std::fs::read_to_string(battery.join("status"))?;
    // a full battery does not always report its capacity
    let capacity = std::fs::read_to_string(battery.join("capacity")).or_else(|err| {
        if status.trim() == "Full" {
            Ok(String::new())
        } else {
            Err(err)
        }
    })?;
    Ok(BatteryStatus::parse(&capacity, &status)?.glyph())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status(percent: u8, charging: bool) -> BatteryStatus {
        BatteryStatus { percent, charging }
    }

    #[test]
    fn test_parse() {
        assert_eq!(BatteryStatus::parse("57\n", "Discharging\n").unwrap(), status(57, false));
        assert_eq!(BatteryStatus::parse("57", "Charging").unwrap(), status(57, true));
        assert_eq!(BatteryStatus::parse("", "Full").unwrap(), status(100, true));
        assert!(BatteryStatus::parse("lots", "Discharging").is_err());
    }

    #[test]
    fn test_glyph_ladder() {
        assert_eq!(status(7, false).glyph(), "\u{f244} (7%)");
        assert_eq!(status(24, false).glyph(), "\u{f244} (24%)");
        assert_eq!(status(25, false).glyph(), "\u{f243}");
        assert_eq!(status(50, false).glyph(), "\u{f242}");
        assert_eq!(status(75, false).glyph(), "\u{f241}");
        assert_eq!(status(95, false).glyph(), "\u{f240}");
        assert_eq!(status(100, true).glyph(), "\u{f1e6} \u{f240}");
    }

    #[test]
    fn test_render_from_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(render(dir.path()), Err(ProviderError::Unavailable(_))));

        std::fs::create_dir(dir.path().join("AC")).unwrap();
        let battery = dir.path().join("BAT0");
        std::fs::create_dir(&battery).unwrap();
        std::fs::write(battery.join("capacity"), "42\n").unwrap();
        std::fs::write(battery.join("status"), "Discharging\n").unwrap();
        assert_eq!(render(dir.path()).unwrap(), "\u{f243}");
    }
}
