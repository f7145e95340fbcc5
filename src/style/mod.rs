//! # Style Primitives
//!
//! Colors and edge values shared by the layout engine and the PDF backend.
//! Colors are stored as 0.0-1.0 components, the form PDF operators take.

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse a `RRGGBB` or `RGB` hex string, with or without a leading `#`.
    pub fn hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FolioError::Markup(format!("invalid color '{}'", hex)));
        }
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(FolioError::Markup(format!("invalid color '{}'", hex))),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| FolioError::Markup(format!("invalid color '{}'", hex)))
        };
        Ok(Self {
            r: channel(0)? as f64 / 255.0,
            g: channel(2)? as f64 / 255.0,
            b: channel(4)? as f64 / 255.0,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Muted grey used for labels.
pub const LABEL_COLOR: Color = Color {
    r: 166.0 / 255.0,
    g: 166.0 / 255.0,
    b: 166.0 / 255.0,
};
/// Grey used for the company address in the footer.
pub const ADDRESS_COLOR: Color = Color {
    r: 136.0 / 255.0,
    g: 136.0 / 255.0,
    b: 136.0 / 255.0,
};
/// Row separator color in the charge table.
pub const BORDER_COLOR: Color = Color {
    r: 204.0 / 255.0,
    g: 204.0 / 255.0,
    b: 204.0 / 255.0,
};
/// Link color in the default footer message.
pub const LINK_COLOR: Color = Color {
    r: 50.0 / 255.0,
    g: 109.0 / 255.0,
    b: 146.0 / 255.0,
};

/// Edge values (top, right, bottom, left) used for cell padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}
