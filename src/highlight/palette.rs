//! Terminal styles for token tags.
//!
//! Uses ANSI colors that adapt to a light or dark terminal background.

use crossterm::style::{Attribute, Color, ContentStyle};

use crate::config::ThemeMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    Dark,
    Light,
}

impl BackgroundMode {
    /// Resolve `theme`, consulting `COLORFGBG` for [`ThemeMode::Auto`].
    pub fn resolve(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Light => Self::Light,
            ThemeMode::Dark => Self::Dark,
            ThemeMode::Auto => from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()),
        }
    }
}

pub fn from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}

/// Maps space-joined tag lists to terminal styles.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    mode: BackgroundMode,
}

impl Palette {
    pub const fn new(mode: BackgroundMode) -> Self {
        Self { mode }
    }

    pub const fn mode(&self) -> BackgroundMode {
        self.mode
    }

    fn pick(&self, dark: Color, light: Color) -> Color {
        match self.mode {
            BackgroundMode::Dark => dark,
            BackgroundMode::Light => light,
        }
    }

    /// Style for a token; inner tags override the colors of outer ones.
    pub fn style_for(&self, tags: Option<&str>) -> ContentStyle {
        let mut style = ContentStyle::new();
        for tag in tags.unwrap_or_default().split_whitespace() {
            self.apply(&mut style, tag);
        }
        style
    }

    fn apply(&self, style: &mut ContentStyle, tag: &str) {
        let fg = match tag {
            "strong" => {
                style.attributes.set(Attribute::Bold);
                None
            }
            "em" => {
                style.attributes.set(Attribute::Italic);
                None
            }
            "underline" => {
                style.attributes.set(Attribute::Underlined);
                None
            }
            "header" => {
                style.attributes.set(Attribute::Bold);
                Some(self.pick(Color::Cyan, Color::AnsiValue(24)))
            }
            "link" => {
                style.attributes.set(Attribute::Underlined);
                Some(self.pick(Color::Blue, Color::DarkBlue))
            }
            "hr" => {
                style.attributes.set(Attribute::Dim);
                Some(self.pick(Color::AnsiValue(240), Color::AnsiValue(241)))
            }
            "comment" => {
                style.attributes.set(Attribute::Italic);
                Some(self.pick(Color::AnsiValue(245), Color::AnsiValue(242)))
            }
            "error" => {
                style.attributes.set(Attribute::Bold);
                Some(self.pick(Color::Red, Color::DarkRed))
            }
            "quote" => Some(self.pick(Color::AnsiValue(180), Color::AnsiValue(88))),
            "def" => Some(self.pick(Color::Yellow, Color::AnsiValue(58))),
            "string" => Some(self.pick(Color::Green, Color::AnsiValue(22))),
            "tag" => Some(self.pick(Color::Magenta, Color::AnsiValue(90))),
            "keyword" => Some(self.pick(Color::AnsiValue(141), Color::AnsiValue(54))),
            "meta" => Some(self.pick(Color::AnsiValue(244), Color::AnsiValue(241))),
            "number" | "atom" => Some(self.pick(Color::AnsiValue(209), Color::AnsiValue(130))),
            "builtin" => Some(self.pick(Color::Cyan, Color::AnsiValue(30))),
            "variable" => Some(self.pick(Color::AnsiValue(153), Color::AnsiValue(25))),
            _ => None,
        };
        if fg.is_some() {
            style.foreground_color = fg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorfgbg_dark_background() {
        assert_eq!(from_colorfgbg(Some("15;0")), BackgroundMode::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        assert_eq!(from_colorfgbg(Some("0;15")), BackgroundMode::Light);
    }

    #[test]
    fn test_colorfgbg_missing_or_garbage_defaults_to_dark() {
        assert_eq!(from_colorfgbg(None), BackgroundMode::Dark);
        assert_eq!(from_colorfgbg(Some("default")), BackgroundMode::Dark);
    }

    #[test]
    fn test_explicit_theme_skips_detection() {
        assert_eq!(BackgroundMode::resolve(ThemeMode::Light), BackgroundMode::Light);
        assert_eq!(BackgroundMode::resolve(ThemeMode::Dark), BackgroundMode::Dark);
    }

    #[test]
    fn test_composed_tags_stack_attributes() {
        let palette = Palette::new(BackgroundMode::Dark);
        let style = palette.style_for(Some("strong em link"));
        assert!(style.attributes.has(Attribute::Bold));
        assert!(style.attributes.has(Attribute::Italic));
        assert!(style.attributes.has(Attribute::Underlined));
        assert_eq!(style.foreground_color, Some(Color::Blue));
    }

    #[test]
    fn test_inner_tag_color_wins() {
        let palette = Palette::new(BackgroundMode::Light);
        let style = palette.style_for(Some("def string"));
        assert_eq!(style.foreground_color, Some(Color::AnsiValue(22)));
    }

    #[test]
    fn test_unstyled_token_is_plain() {
        let palette = Palette::new(BackgroundMode::Dark);
        assert_eq!(palette.style_for(None), ContentStyle::new());
        assert_eq!(palette.style_for(Some("unknown")), ContentStyle::new());
    }
}
