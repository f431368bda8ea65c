// File: ./src/color_utils.rs
// Color helpers shared by the TUI and the CLI. No terminal crates in here.

use crate::model::Priority;
use std::hash::{Hash, Hasher};

/// Deterministic (r, g, b) for a string, used when a board has no usable color.
pub fn generate_color(seed: &str) -> (u8, u8, u8) {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    seed.hash(&mut hasher);
    let hash = hasher.finish();

    let h = (hash % 360) as f32;
    // Saturation 0.45..0.85, lightness 0.45..0.65
    let s = 0.45 + ((hash >> 16) % 41) as f32 / 100.0;
    let l = 0.45 + ((hash >> 32) % 21) as f32 / 100.0;

    let (r, g, b) = hsl_to_rgb(h, s, l);
    (to_u8(r), to_u8(g), to_u8(b))
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = if (0.0..60.0).contains(&h) {
        (c, x, 0.0)
    } else if (60.0..120.0).contains(&h) {
        (x, c, 0.0)
    } else if (120.0..180.0).contains(&h) {
        (0.0, c, x)
    } else if (180.0..240.0).contains(&h) {
        (0.0, x, c)
    } else if (240.0..300.0).contains(&h) {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r1 + m, g1 + m, b1 + m)
}

/// Whether text drawn on this color should be light.
pub fn is_dark(r: u8, g: u8, b: u8) -> bool {
    let brightness = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    brightness < 128.0
}

/// "#RRGGBB" or "RRGGBB".
pub fn parse_hex_to_u8(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Accent for a board: its own color, or one derived from its name.
pub fn board_rgb(color: &str, name: &str) -> (u8, u8, u8) {
    parse_hex_to_u8(color).unwrap_or_else(|| generate_color(name))
}

/// Priority accent, brighter on dark backgrounds.
pub fn priority_rgb(priority: Priority, is_dark_theme: bool) -> (u8, u8, u8) {
    match (priority, is_dark_theme) {
        (Priority::High, true) => (255, 85, 85),
        (Priority::Med, true) => (255, 184, 76),
        (Priority::Low, true) => (150, 190, 220),
        (Priority::High, false) => (190, 20, 20),
        (Priority::Med, false) => (200, 110, 0),
        (Priority::Low, false) => (60, 90, 140),
    }
}
