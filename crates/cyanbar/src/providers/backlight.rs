use std::path::Path;

use crate::error::ProviderError;

fn read_number(path: &Path) -> Result<u64, ProviderError> {
    let content = std::fs::read_to_string(path)?;
    content.trim().parse().map_err(|_| ProviderError::Parse(format!("{} in {}", content.trim(), path.display())))
}

pub fn glyph(brightness: u64, max_brightness: u64) -> Result<&'static str, ProviderError> {
    if max_brightness == 0 {
        return Err(ProviderError::Parse("max_brightness is 0".to_string()));
    }
    let percent = 100.0 * brightness as f64 / max_brightness as f64;
    Ok(if percent < 33.3 {
        "\u{f006}"
    } else if percent < 66.6 {
        "\u{f123}"
    } else {
        "\u{f005}"
    })
}

pub fn render(backlight_dir: &Path) -> Result<String, ProviderError> {
    let max_brightness = read_number(&backlight_dir.join("max_brightness"))?;
    let brightness = read_number(&backlight_dir.join("brightness"))?;
    glyph(brightness, max_brightness).map(str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_glyph() {
        assert_eq!(glyph(0, 100).unwrap(), "\u{f006}");
        assert_eq!(glyph(33, 100).unwrap(), "\u{f006}");
        assert_eq!(glyph(34, 100).unwrap(), "\u{f123}");
        assert_eq!(glyph(937, 937).unwrap(), "\u{f005}");
        assert!(glyph(1, 0).is_err());
    }

    #[test]
    fn test_render_from_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(render(dir.path()), Err(ProviderError::Io(_))));
        std::fs::write(dir.path().join("max_brightness"), "1000\n").unwrap();
        std::fs::write(dir.path().join("brightness"), "500\n").unwrap();
        assert_eq!(render(dir.path()).unwrap(), "\u{f123}");
    }
}
