//! Command line for the lemonbar process.

use barpyrus_config::BarSettings;
use barpyrus_core::Result;
use tracing::info;

use crate::channel::Channel;
use crate::herbstluft::Rect;

/// Arguments lemonbar is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct LemonbarCommand {
    program: String,
    geometry: Option<Rect>,
    clickable_areas: u32,
    underline_width: u32,
    background: String,
    fonts: Vec<String>,
}

impl LemonbarCommand {
    /// Build the command from configuration; `geometry` positions the bar.
    pub fn from_settings(settings: &BarSettings, geometry: Option<Rect>) -> Self {
        Self {
            program: settings.command.clone(),
            geometry,
            clickable_areas: settings.clickable_areas,
            underline_width: settings.underline_width,
            background: settings.background.clone(),
            fonts: settings.fonts.clone(),
        }
    }

    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        if let Some(rect) = self.geometry {
            argv.push("-g".into());
            argv.push(format!(
                "{}x{}{:+}{:+}",
                rect.width, rect.height, rect.x, rect.y
            ));
        }
        argv.extend([
            "-a".to_string(),
            self.clickable_areas.to_string(),
            "-d".to_string(),
            "-u".to_string(),
            self.underline_width.to_string(),
            "-B".to_string(),
            self.background.clone(),
        ]);
        for font in &self.fonts {
            argv.push("-f".into());
            argv.push(font.clone());
        }
        argv
    }

    pub fn spawn(&self) -> Result<Channel> {
        let argv = self.argv();
        info!(?argv, "starting lemonbar");
        Channel::spawn(&argv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_with_geometry() {
        let settings = BarSettings {
            fonts: vec!["fixed".into()],
            ..BarSettings::default()
        };
        let rect = Rect {
            x: 1920,
            y: 0,
            width: 1280,
            height: 16,
        };
        let argv = LemonbarCommand::from_settings(&settings, Some(rect)).argv();
        assert_eq!(
            argv,
            vec![
                "lemonbar", "-g", "1280x16+1920+0", "-a", "100", "-d", "-u", "2", "-B",
                "#ee121212", "-f", "fixed",
            ]
        );
    }

    #[test]
    fn test_argv_negative_offset_and_fonts() {
        let settings = BarSettings::default();
        let rect = Rect {
            x: -5,
            y: 10,
            width: 800,
            height: 20,
        };
        let argv = LemonbarCommand::from_settings(&settings, Some(rect)).argv();
        assert_eq!(argv[2], "800x20-5+10");
        assert_eq!(argv.iter().filter(|a| *a == "-f").count(), 2);

        let argv = LemonbarCommand::from_settings(&settings, None).argv();
        assert!(!argv.contains(&"-g".to_string()));
    }
}
