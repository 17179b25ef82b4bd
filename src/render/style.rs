//! Visual constants for the card page.
//!
//! Every colour and font size the renderer uses lives in one [`CardStyle`].
//! It deserialises from the `style:` block of the YAML config; omitted
//! fields keep the defaults below.

use crate::error::ModelCardError;
use genpdf::style::{Color, Style};
use serde::{Deserialize, Serialize};

/// Font size and weight of one text role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: u8,
    #[serde(default)]
    pub bold: bool,
    /// Use the primary colour instead of the text colour.
    #[serde(default)]
    pub accent: bool,
}

impl TextStyle {
    const fn new(font_size: u8, bold: bool, accent: bool) -> Self {
        Self {
            font_size,
            bold,
            accent,
        }
    }
}

/// Complete page style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardStyle {
    pub title_style: TextStyle,
    pub subtitle_style: TextStyle,
    pub section_style: TextStyle,
    pub body_style: TextStyle,
    pub footer_style: TextStyle,
    /// `#RRGGBB`.
    pub primary_color: String,
    pub text_color: String,
    /// Fill for blank image placeholders.
    pub background_color: String,
    /// Page margin on every side.
    pub margin_mm: f64,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            title_style: TextStyle::new(24, true, true),
            subtitle_style: TextStyle::new(14, false, false),
            section_style: TextStyle::new(12, true, true),
            body_style: TextStyle::new(10, false, false),
            footer_style: TextStyle::new(8, false, false),
            primary_color: "#005CB9".into(),
            text_color: "#1a1a1a".into(),
            background_color: "#f5f5f5".into(),
            margin_mm: 12.7,
        }
    }
}

impl CardStyle {
    /// Check every colour parses. Called once before rendering so a typo in
    /// the config fails fast instead of half-way through a page.
    pub fn validate(&self) -> Result<(), ModelCardError> {
        for (field, value) in [
            ("primary_color", &self.primary_color),
            ("text_color", &self.text_color),
            ("background_color", &self.background_color),
        ] {
            parse_hex_color(value).ok_or_else(|| {
                ModelCardError::InvalidConfig(format!(
                    "style.{field} must be a #RRGGBB colour, got '{value}'"
                ))
            })?;
        }
        if !(0.0..=50.0).contains(&self.margin_mm) {
            return Err(ModelCardError::InvalidConfig(format!(
                "style.margin_mm must be between 0 and 50, got {}",
                self.margin_mm
            )));
        }
        Ok(())
    }

    pub(crate) fn primary(&self) -> Color {
        color_or_black(&self.primary_color)
    }

    pub(crate) fn text(&self) -> Color {
        color_or_black(&self.text_color)
    }

    pub(crate) fn background(&self) -> Color {
        parse_hex_color(&self.background_color)
            .map(|(r, g, b)| Color::Rgb(r, g, b))
            .unwrap_or(Color::Rgb(245, 245, 245))
    }

    /// The genpdf style for a text role.
    pub(crate) fn font(&self, role: &TextStyle) -> Style {
        let color = if role.accent { self.primary() } else { self.text() };
        let style = Style::new().with_font_size(role.font_size).with_color(color);
        if role.bold {
            style.bold()
        } else {
            style
        }
    }
}

fn color_or_black(hex: &str) -> Color {
    parse_hex_color(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Rgb(0, 0, 0))
}

/// `#RRGGBB` (leading `#` optional) to RGB.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
