use std::time::Duration;

use super::run_command;
use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerLevel {
    pub percent: u8,
    pub enabled: bool,
}

impl MixerLevel {
    /// Parse the first `Front Left:` line of `amixer get` output.
    pub fn parse(output: &str) -> Result<Self, ProviderError> {
        let line = output
            .lines()
            .find(|line| line.contains("Front Left:"))
            .ok_or_else(|| ProviderError::Parse("no `Front Left:` channel in amixer output".to_string()))?;
        let captures = crate::regex!(r"\[(\d+)%\](?:.*\[(on|off)\])?")
            .captures(line)
            .ok_or_else(|| ProviderError::Parse(format!("mixer channel `{}`", line.trim())))?;
        let percent = captures[1].parse().map_err(|_| ProviderError::Parse(format!("volume `{}`", &captures[1])))?;
        let enabled = captures.get(2).map_or(true, |state| state.as_str() == "on");
        Ok(MixerLevel { percent, enabled })
    }

    pub fn glyph(&self) -> &'static str {
        if !self.enabled || self.percent == 0 {
            "\u{f026}"
        } else if self.percent < 50 {
            "\u{f027}"
        } else {
            "\u{f028}"
        }
    }
}

pub fn render(timeout: Duration) -> Result<String, ProviderError> {
    let output = run_command("amixer", &["-D", "pulse", "get", "Master"], timeout)?;
    Ok(MixerLevel::parse(&output)?.glyph().to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    const AMIXER: &str = "Simple mixer control 'Master',0
  Capabilities: pvolume pswitch pswitch-joined
  Playback channels: Front Left - Front Right
  Limits: Playback 0 - 65536
  Mono:
  Front Left: Playback 26214 [40%] [on]
  Front Right: Playback 26214 [40%] [on]
";

    #[test]
    fn test_parse() {
        assert_eq!(MixerLevel::parse(AMIXER).unwrap(), MixerLevel { percent: 40, enabled: true });
        let muted = AMIXER.replace("[on]", "[off]");
        assert_eq!(MixerLevel::parse(&muted).unwrap(), MixerLevel { percent: 40, enabled: false });
        assert!(MixerLevel::parse("Simple mixer control 'Master',0\n").is_err());
    }

    #[test]
    fn test_glyph() {
        assert_eq!(MixerLevel { percent: 80, enabled: false }.glyph(), "\u{f026}");
        assert_eq!(MixerLevel { percent: 0, enabled: true }.glyph(), "\u{f026}");
        assert_eq!(MixerLevel { percent: 49, enabled: true }.glyph(), "\u{f027}");
        assert_eq!(MixerLevel { percent: 100, enabled: true }.glyph(), "\u{f028}");
    }
}
