use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Mark colour for rows without a colour tag.
pub const DEFAULT_COLOR: Color32 = Color32::from_rgb(31, 119, 180);

/// Fill colour of selected (highlighted) marks.
pub const SELECTION_COLOR: Color32 = Color32::from_rgb(0, 160, 60);

/// Overview grid marker colour.
pub const OVERVIEW_COLOR: Color32 = Color32::from_rgb(250, 128, 114);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Colour tags: "#rrggbb", "#rgb", a few names, or anything else
// ---------------------------------------------------------------------------

/// Parse a colour tag that spells out a colour directly.
pub fn parse_color_tag(tag: &str) -> Option<Color32> {
    let tag = tag.trim();
    if let Some(hex) = tag.strip_prefix('#') {
        return parse_hex(hex);
    }
    let named = match tag.to_ascii_lowercase().as_str() {
        "black" => Color32::BLACK,
        "white" => Color32::WHITE,
        "gray" | "grey" => Color32::GRAY,
        "red" => Color32::from_rgb(214, 39, 40),
        "green" => Color32::from_rgb(44, 160, 44),
        "blue" => Color32::from_rgb(31, 119, 180),
        "orange" => Color32::from_rgb(255, 127, 14),
        "purple" => Color32::from_rgb(148, 103, 189),
        "brown" => Color32::from_rgb(140, 86, 75),
        "pink" => Color32::from_rgb(227, 119, 194),
        "olive" => Color32::from_rgb(188, 189, 34),
        "cyan" => Color32::from_rgb(23, 190, 207),
        "salmon" => Color32::from_rgb(250, 128, 114),
        "navy" => Color32::from_rgb(0, 0, 128),
        _ => return None,
    };
    Some(named)
}

fn parse_hex(hex: &str) -> Option<Color32> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
        }
        3 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Color32::from_rgb(channel(0)?, channel(1)?, channel(2)?))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Color mapping: colour tag → Color32
// ---------------------------------------------------------------------------

/// Maps the colour tags of a table to concrete colours.
///
/// Tags that spell a colour are used as-is; the rest get evenly spaced
/// palette colours in first-appearance order.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(tags: &[String]) -> Self {
        let unnamed: Vec<&String> = tags
            .iter()
            .filter(|t| parse_color_tag(t).is_none())
            .collect();
        let palette = generate_palette(unnamed.len());

        let mut mapping: BTreeMap<String, Color32> = unnamed
            .into_iter()
            .zip(palette)
            .map(|(t, c)| (t.clone(), c))
            .collect();
        for tag in tags {
            if let Some(c) = parse_color_tag(tag) {
                mapping.insert(tag.clone(), c);
            }
        }

        ColorMap {
            mapping,
            default_color: DEFAULT_COLOR,
        }
    }

    /// Look up the colour for a row's (optional) tag.
    pub fn color_for(&self, tag: Option<&str>) -> Color32 {
        tag.and_then(|t| self.mapping.get(t))
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (tag → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(t, c)| (t.clone(), *c))
            .collect()
    }
}
