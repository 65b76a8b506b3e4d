use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

use crate::theme::catppuccin::Mocha as P;

const DEFAULT_HISTORY_SIZE: usize = 1_000;

/// Highlighter colors for the interactive command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub verb: Color,
    pub number: Color,
    pub operator: Color,
    pub unknown: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            verb: P::SKY,
            number: P::PEACH,
            operator: P::MAUVE,
            unknown: P::RED,
        }
    }
}

/// User settings read from `bfdbg.toml` in the XDG config home.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub colors: Colors,
    pub history_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            colors: Colors::default(),
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_from_toml().unwrap_or_default())
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
    } else {
        // Named colors matching nu_ansi_term::Color variants
        let name = s.to_ascii_lowercase();
        return Some(match name.as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "purple" | "magenta" => Color::Purple,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" | "darkgray" | "dark_gray" => Color::DarkGray,
            "lightred" | "light_red" => Color::LightRed,
            "lightgreen" | "light_green" => Color::LightGreen,
            "lightblue" | "light_blue" => Color::LightBlue,
            "lightcyan" | "light_cyan" => Color::LightCyan,
            _ => return None,
        });
    }
    None
}

fn config_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new().ok()?;

    // On Linux: resolves to /home/<user>/.config
    // On macOS: resolves to /Users/<user>/.config
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bfdbg.toml");
    Some(path)
}

fn load_from_toml() -> Option<Settings> {
    let content = fs::read_to_string(config_path()?).ok()?;
    let settings = parse_settings(&content);
    tracing::debug!(?settings, "loaded user settings");
    Some(settings)
}

/// Parse the small subset of TOML the settings file uses: `[section]`
/// headers and `key = value` pairs, values optionally quoted.
/// Unknown keys and unparsable values fall back to defaults.
pub fn parse_settings(content: &str) -> Settings {
    let mut section = String::new();
    let mut map: HashMap<(String, String), String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len()-1].trim().to_string();
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq+1..].trim();
            // Accept quoted or unquoted
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len()-1].to_string()
            } else { val_raw.to_string() };
            map.insert((section.clone(), key), val);
        }
    }

    let get = |section: &str, key: &str| map.get(&(section.to_string(), key.to_string()));
    let mut cfg = Settings::default();

    macro_rules! set_color {
        ($field:ident) => {
            if let Some(v) = get("colors", stringify!($field)).and_then(|s| parse_color(s)) {
                cfg.colors.$field = v;
            }
        };
    }

    set_color!(verb);
    set_color!(number);
    set_color!(operator);
    set_color!(unknown);

    if let Some(size) = get("history", "size").and_then(|s| s.parse::<usize>().ok()) {
        cfg.history_size = size.max(1);
    }

    cfg
}
