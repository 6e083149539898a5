//! Color themes for the stage table.

use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// A complete theme definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Theme {
    // Base colors
    pub bg_dark: Color,
    pub bg_surface: Color,
    pub bg_elevated: Color,
    pub bg_selected: Color,

    // Borders
    pub border_dim: Color,

    // Text
    pub text_muted: Color,
    pub text_normal: Color,
    pub text_bright: Color,

    // Accent
    pub accent: Color,

    // Stage cells
    pub cell_present: Color,
    pub cell_unavailable: Color,

    // Diff lines
    pub diff_insert: Color,
    pub diff_delete: Color,
    pub diff_hunk: Color,

    // Status
    pub error: Color,
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::builtin_default()
    }
}

/// JSON theme file format.
///
/// `defs` names reusable hex colors; each theme field is a hex color or a
/// def name. Missing fields fall back to the default theme.
#[derive(Debug, Deserialize)]
#[allow(missing_docs)]
pub struct ThemeJson {
    #[serde(default)]
    pub defs: HashMap<String, String>,
    #[serde(default)]
    pub theme: HashMap<String, String>,
}

impl Theme {
    /// Load a theme by name: user themes first, then builtins.
    pub fn load(name: &str) -> Self {
        if let Some(theme) = load_user_theme(name) {
            return theme;
        }

        match name {
            "light" => Self::light(),
            "mono" => Self::mono(),
            _ => Self::builtin_default(),
        }
    }

    /// Dark default theme.
    pub fn builtin_default() -> Self {
        Self {
            bg_dark: Color::Rgb(18, 18, 22),
            bg_surface: Color::Rgb(26, 26, 32),
            bg_elevated: Color::Rgb(36, 36, 44),
            bg_selected: Color::Rgb(45, 45, 55),

            border_dim: Color::Rgb(50, 50, 60),

            text_muted: Color::Rgb(80, 80, 92),
            text_normal: Color::Rgb(175, 175, 185),
            text_bright: Color::Rgb(230, 230, 235),

            accent: Color::Rgb(80, 200, 200),

            cell_present: Color::Rgb(85, 185, 105),
            cell_unavailable: Color::Rgb(110, 110, 125),

            diff_insert: Color::Rgb(85, 185, 105),
            diff_delete: Color::Rgb(215, 85, 85),
            diff_hunk: Color::Rgb(97, 175, 239),

            error: Color::Rgb(215, 85, 85),
            warning: Color::Rgb(215, 175, 80),
        }
    }

    /// Light background theme.
    pub fn light() -> Self {
        Self {
            bg_dark: Color::Rgb(250, 250, 250),
            bg_surface: Color::Rgb(242, 242, 244),
            bg_elevated: Color::Rgb(230, 230, 234),
            bg_selected: Color::Rgb(210, 225, 240),

            border_dim: Color::Rgb(200, 200, 208),

            text_muted: Color::Rgb(140, 140, 150),
            text_normal: Color::Rgb(50, 50, 60),
            text_bright: Color::Rgb(10, 10, 15),

            accent: Color::Rgb(0, 120, 140),

            cell_present: Color::Rgb(30, 130, 60),
            cell_unavailable: Color::Rgb(150, 150, 160),

            diff_insert: Color::Rgb(30, 130, 60),
            diff_delete: Color::Rgb(180, 40, 40),
            diff_hunk: Color::Rgb(30, 90, 180),

            error: Color::Rgb(180, 40, 40),
            warning: Color::Rgb(170, 120, 0),
        }
    }

    /// Basic ANSI colors for terminals without true color.
    pub fn mono() -> Self {
        Self {
            bg_dark: Color::Reset,
            bg_surface: Color::Reset,
            bg_elevated: Color::Black,
            bg_selected: Color::DarkGray,

            border_dim: Color::Gray,

            text_muted: Color::DarkGray,
            text_normal: Color::Gray,
            text_bright: Color::White,

            accent: Color::Cyan,

            cell_present: Color::Green,
            cell_unavailable: Color::DarkGray,

            diff_insert: Color::Green,
            diff_delete: Color::Red,
            diff_hunk: Color::Blue,

            error: Color::Red,
            warning: Color::Yellow,
        }
    }
}

/// Get user themes directory (`<config dir>/themes/`).
fn user_themes_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gitradar").map(|d| d.config_dir().join("themes"))
}

/// Load a theme from user themes directory.
fn load_user_theme(name: &str) -> Option<Theme> {
    let path = user_themes_dir()?.join(format!("{}.json", name));
    if !path.exists() {
        return None;
    }

    let content = std::fs::read_to_string(&path).ok()?;
    let json: ThemeJson = serde_json::from_str(&content).ok()?;
    Some(resolve_theme(&json))
}

/// Parse a hex color string to Color.
fn parse_hex(s: &str) -> Option<Color> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;

    Some(Color::Rgb(r, g, b))
}

/// Resolve a color value (hex or reference).
fn resolve_color(value: &str, defs: &HashMap<String, String>, fallback: Color) -> Color {
    if value.starts_with('#') {
        parse_hex(value).unwrap_or(fallback)
    } else if let Some(def) = defs.get(value) {
        parse_hex(def).unwrap_or(fallback)
    } else {
        fallback
    }
}

/// Resolve a theme JSON to a Theme struct.
pub fn resolve_theme(json: &ThemeJson) -> Theme {
    let mut theme = Theme::builtin_default();
    let defs = &json.defs;

    for (key, value) in &json.theme {
        let slot = match key.as_str() {
            "bgDark" => &mut theme.bg_dark,
            "bgSurface" => &mut theme.bg_surface,
            "bgElevated" => &mut theme.bg_elevated,
            "bgSelected" => &mut theme.bg_selected,
            "borderDim" => &mut theme.border_dim,
            "textMuted" => &mut theme.text_muted,
            "textNormal" => &mut theme.text_normal,
            "textBright" => &mut theme.text_bright,
            "accent" => &mut theme.accent,
            "cellPresent" => &mut theme.cell_present,
            "cellUnavailable" => &mut theme.cell_unavailable,
            "diffInsert" => &mut theme.diff_insert,
            "diffDelete" => &mut theme.diff_delete,
            "diffHunk" => &mut theme.diff_hunk,
            "error" => &mut theme.error,
            "warning" => &mut theme.warning,
            _ => continue,
        };
        *slot = resolve_color(value, defs, *slot);
    }

    theme
}
