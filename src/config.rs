use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::CALLBACK_PORT_DEFAULT;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sweep backend base URL (no trailing slash)
    pub api_base_url: String,
    /// Local port the OAuth redirect lands on
    pub callback_port: u16,
    pub layout: LayoutConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pattern column width in characters
    pub pattern_width: usize,
    /// Destination column width in characters
    pub destination_width: usize,
    /// Created-date column width in characters
    pub date_width: usize,
}

/// Semantic theme configuration using Capstan Cloud colors as defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    // Base colors
    pub bg: String,
    pub bg_panel: String,
    pub bg_element: String,
    pub fg: String,
    pub fg_muted: String,
    pub fg_subtle: String,

    // Border colors
    pub border: String,
    pub border_subtle: String,
    pub border_active: String,

    // Accent colors
    pub primary: String,
    pub secondary: String,

    // Semantic colors
    pub success: String,
    pub warning: String,
    pub error: String,
    pub info: String,

    // UI-specific mappings
    pub selected_bg: String,
    pub disabled: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            callback_port: CALLBACK_PORT_DEFAULT,
            layout: LayoutConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pattern_width: 30,
            destination_width: 20,
            date_width: 12,
        }
    }
}

/// Capstan Cloud theme - warm earth tones with gold accents
impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            // Base colors
            bg: "#1a1917".to_string(),
            bg_panel: "#262422".to_string(),
            bg_element: "#393634".to_string(),
            fg: "#f7f7f5".to_string(),
            fg_muted: "#8c8985".to_string(),
            fg_subtle: "#b8b5b0".to_string(),

            // Border colors
            border: "#524f4c".to_string(),
            border_subtle: "#393634".to_string(),
            border_active: "#d4a366".to_string(), // primary

            // Accent colors
            primary: "#d4a366".to_string(),
            secondary: "#8fa5ae".to_string(), // blue

            // Semantic colors
            success: "#52c41a".to_string(),
            warning: "#faad14".to_string(),
            error: "#ff4d4f".to_string(),
            info: "#88c0d0".to_string(), // cyan

            // UI-specific mappings
            selected_bg: "#393634".to_string(), // bg_element
            disabled: "#8c8985".to_string(),    // fg_muted
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = dirs::config_dir()
            .map(|p| p.join("sweeptui/config.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/sweeptui/config.toml"));

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Config parse error: {}", e),
                },
                Err(e) => eprintln!("Config read error: {}", e),
            }
        }

        Self::default()
    }
}

impl ThemeConfig {
    // Convenience methods for common colors
    pub fn bg(&self) -> ratatui::style::Color {
        parse_color(&self.bg)
    }
    pub fn bg_panel(&self) -> ratatui::style::Color {
        parse_color(&self.bg_panel)
    }
    pub fn bg_element(&self) -> ratatui::style::Color {
        parse_color(&self.bg_element)
    }
    pub fn fg(&self) -> ratatui::style::Color {
        parse_color(&self.fg)
    }
    pub fn fg_muted(&self) -> ratatui::style::Color {
        parse_color(&self.fg_muted)
    }
    pub fn fg_subtle(&self) -> ratatui::style::Color {
        parse_color(&self.fg_subtle)
    }
    pub fn border(&self) -> ratatui::style::Color {
        parse_color(&self.border)
    }
    pub fn border_subtle(&self) -> ratatui::style::Color {
        parse_color(&self.border_subtle)
    }
    pub fn border_active(&self) -> ratatui::style::Color {
        parse_color(&self.border_active)
    }
    pub fn primary(&self) -> ratatui::style::Color {
        parse_color(&self.primary)
    }
    pub fn secondary(&self) -> ratatui::style::Color {
        parse_color(&self.secondary)
    }
    pub fn success(&self) -> ratatui::style::Color {
        parse_color(&self.success)
    }
    pub fn warning(&self) -> ratatui::style::Color {
        parse_color(&self.warning)
    }
    pub fn error(&self) -> ratatui::style::Color {
        parse_color(&self.error)
    }
    pub fn info(&self) -> ratatui::style::Color {
        parse_color(&self.info)
    }
    pub fn selected_bg(&self) -> ratatui::style::Color {
        parse_color(&self.selected_bg)
    }
    pub fn disabled(&self) -> ratatui::style::Color {
        parse_color(&self.disabled)
    }
}

/// Parse color string to ratatui Color
pub fn parse_color(s: &str) -> ratatui::style::Color {
    use ratatui::style::Color;

    // Try hex first (#RRGGBB)
    if s.starts_with('#') && s.len() == 7 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&s[1..3], 16),
            u8::from_str_radix(&s[3..5], 16),
            u8::from_str_radix(&s[5..7], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }

    // Named colors
    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        _ => Color::White,
    }
}
