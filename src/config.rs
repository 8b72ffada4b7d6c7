use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::dial::DisplayShape;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub face: FaceConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default = "default_anchor")]
    pub anchor: String,
    #[serde(default = "default_margin")]
    pub margin_top: i32,
    #[serde(default)]
    pub margin_bottom: i32,
    #[serde(default)]
    pub margin_left: i32,
    #[serde(default = "default_margin")]
    pub margin_right: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceConfig {
    #[serde(default = "default_shape")]
    pub shape: DisplayShape,
    /// Explicit surface size; 0 means use the shape's native size.
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_date_align")]
    pub date_align: String,
}

impl FaceConfig {
    pub fn bounds(&self) -> (u32, u32) {
        if self.width > 0 && self.height > 0 {
            (self.width, self.height)
        } else {
            self.shape.default_bounds()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_bg_color", deserialize_with = "deserialize_color")]
    pub bg_color: [u8; 4],
    #[serde(default = "default_ink_color", deserialize_with = "deserialize_color")]
    pub tick_color: [u8; 4],
    #[serde(default = "default_hand_color", deserialize_with = "deserialize_color")]
    pub hand_color: [u8; 4],
    #[serde(default = "default_ink_color", deserialize_with = "deserialize_color")]
    pub hand_outline_color: [u8; 4],
    #[serde(default = "default_second_hand_color", deserialize_with = "deserialize_color")]
    pub second_hand_color: [u8; 4],
    #[serde(default = "default_ink_color", deserialize_with = "deserialize_color")]
    pub dot_color: [u8; 4],
    #[serde(default = "default_ink_color", deserialize_with = "deserialize_color")]
    pub date_color: [u8; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Path to a PNG/JPEG drawn behind the dial; empty = bg_color fill.
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_image_scale")]
    pub scale: String,
}

// Defaults

fn default_layer() -> String { "top".into() }
fn default_anchor() -> String { "top right".into() }
fn default_margin() -> i32 { 20 }
fn default_opacity() -> f32 { 1.0 }
fn default_shape() -> DisplayShape { DisplayShape::Rectangular }
fn default_font() -> String { "sans".into() }
fn default_font_size() -> f32 { 16.0 }
fn default_date_format() -> String { "%d %b".into() }
fn default_date_align() -> String { "bottom".into() }
fn default_image_scale() -> String { "fill".into() }

fn default_bg_color() -> [u8; 4] { [0xFF, 0xFF, 0xFF, 0xFF] }
fn default_ink_color() -> [u8; 4] { [0x00, 0x00, 0x00, 0xFF] }
fn default_hand_color() -> [u8; 4] { [0xFF, 0xFF, 0xFF, 0xFF] }
fn default_second_hand_color() -> [u8; 4] { [0xEF, 0x44, 0x44, 0xFF] }

fn deserialize_color<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 4], D::Error> {
    let s = String::deserialize(d)?;
    parse_color(&s).map_err(serde::de::Error::custom)
}

pub fn parse_color(s: &str) -> Result<[u8; 4]> {
    let s = s.trim_start_matches('#');
    anyhow::ensure!(s.len() == 6 || s.len() == 8, "Color must be RRGGBB or RRGGBBAA");
    let r = u8::from_str_radix(&s[0..2], 16)?;
    let g = u8::from_str_radix(&s[2..4], 16)?;
    let b = u8::from_str_radix(&s[4..6], 16)?;
    let a = if s.len() == 8 { u8::from_str_radix(&s[6..8], 16)? } else { 0xFF };
    Ok([r, g, b, a])
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            anchor: default_anchor(),
            margin_top: default_margin(),
            margin_bottom: 0,
            margin_left: 0,
            margin_right: default_margin(),
            opacity: default_opacity(),
        }
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            width: 0,
            height: 0,
            font: default_font(),
            font_size: default_font_size(),
            date_format: default_date_format(),
            date_align: default_date_align(),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            image: String::new(),
            scale: default_image_scale(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            bg_color: default_bg_color(),
            tick_color: default_ink_color(),
            hand_color: default_hand_color(),
            hand_outline_color: default_ink_color(),
            second_hand_color: default_second_hand_color(),
            dot_color: default_ink_color(),
            date_color: default_ink_color(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs_path().join("config.toml")
}

fn dirs_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(".config")
        });
    base.join("tickface")
}

pub fn load_config(path: &std::path::Path) -> Result<WatchConfig> {
    if !path.exists() {
        log::info!("Config file not found at {}, generating default", path.display());
        let content = generate_default_config();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(path, &content) {
            Ok(()) => log::info!("Created default config at {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
        return Ok(WatchConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: WatchConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// Persist a shape change back to the config file, preserving the file's
/// formatting and comments.
pub fn save_shape_to_config(path: &std::path::Path, shape: DisplayShape) {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Failed to read config: {}", e);
            return;
        }
    };
    let mut doc = match content.parse::<toml_edit::DocumentMut>() {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("Failed to parse config: {}", e);
            return;
        }
    };

    if !doc.contains_key("face") {
        doc["face"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["face"]["shape"] = toml_edit::value(shape.as_str());

    if let Err(e) = std::fs::write(path, doc.to_string()) {
        log::warn!("Failed to write config: {}", e);
        return;
    }
    log::info!("Persisted shape to {}", path.display());
}

fn generate_default_config() -> String {
    r#"# tickface — analog watch face widget
# Configuration file — generated automatically on first run.
# Uncomment and edit values to customise. Defaults are shown.

[window]
# Layer: background | bottom | top | overlay
layer  = "top"
# Anchor edges: top | bottom | left | right (space-separated)
anchor = "top right"
# Margins from anchored edges (px)
margin_top    = 20
margin_right  = 20
margin_bottom = 0
margin_left   = 0
# Window opacity 0.0–1.0
opacity = 1.0

[face]
# Display geometry: "round" (180x180) | "rectangular" (144x168)
shape = "rectangular"
# Explicit surface size in px (0 = use the shape's native size)
width  = 0
height = 0
# Font: system font name or path to .ttf/.otf
font = "sans"
# Date label size in px
font_size = 16.0
# Date format string (chrono strftime)
date_format = "%d %b"
# Date label placement: top | center | bottom
date_align = "bottom"

[theme]
# Colours in RRGGBB or RRGGBBAA hex (# prefix optional)
bg_color           = "FFFFFFFF"
tick_color         = "000000FF"
hand_color         = "FFFFFFFF"
hand_outline_color = "000000FF"
second_hand_color  = "ef4444FF"
dot_color          = "000000FF"
date_color         = "000000FF"

[background]
# Path to a PNG/JPEG drawn behind the dial (empty = bg_color fill)
image = ""
# Scale mode: "fill" | "fit" | "stretch" | "center"
scale = "fill"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color_forms() {
        assert_eq!(parse_color("ef4444").unwrap(), [0xEF, 0x44, 0x44, 0xFF]);
        assert_eq!(parse_color("#00000080").unwrap(), [0, 0, 0, 0x80]);
        assert!(parse_color("red").is_err());
        assert!(parse_color("12345").is_err());
    }

    #[test]
    fn generated_default_config_parses_to_defaults() {
        let parsed: WatchConfig = toml::from_str(&generate_default_config()).unwrap();
        let defaults = WatchConfig::default();
        assert_eq!(parsed.face.shape, defaults.face.shape);
        assert_eq!(parsed.face.date_format, defaults.face.date_format);
        assert_eq!(parsed.theme.second_hand_color, defaults.theme.second_hand_color);
        assert_eq!(parsed.window.margin_top, defaults.window.margin_top);
        assert_eq!(parsed.background.scale, defaults.background.scale);
    }

    #[test]
    fn face_bounds_follow_shape_unless_overridden() {
        let mut face = FaceConfig::default();
        assert_eq!(face.bounds(), (144, 168));
        face.shape = DisplayShape::Round;
        assert_eq!(face.bounds(), (180, 180));
        face.width = 240;
        face.height = 240;
        assert_eq!(face.bounds(), (240, 240));
    }

    #[test]
    fn shape_spellings() {
        assert_eq!(DisplayShape::parse("round"), Some(DisplayShape::Round));
        assert_eq!(DisplayShape::parse("rect"), Some(DisplayShape::Rectangular));
        assert_eq!(DisplayShape::parse("square"), None);
    }
}
