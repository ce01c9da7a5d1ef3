//! Color normalization, sRGB to Lab conversion, and CIE94 distance.

use serde::{Deserialize, Serialize};

/// An RGBA color with channels in [0, 1], as stored in drawing palettes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl PaletteColor {
    /// Build an opaque color from a normalized 6-digit hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let (r, g, b) = hex_to_rgb8(hex)?;
        Some(Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        })
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
        )
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Parse a normalized `#rrggbb` string into 8-bit channels.
pub fn hex_to_rgb8(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Normalize a CSS color string to 6-digit lowercase hex.
///
/// Returns `None` for `transparent`, `none`, and anything unrecognized —
/// all of which mean "no paint" to the flattener.
pub fn normalize(input: &str) -> Option<String> {
    let v = input.trim().to_ascii_lowercase();

    if let Some(hex) = v.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => {
                let mut out = String::with_capacity(7);
                out.push('#');
                for c in hex.chars() {
                    out.push(c);
                    out.push(c);
                }
                Some(out)
            }
            6 => Some(format!("#{hex}")),
            // #rrggbbaa: alpha dropped
            8 => Some(format!("#{}", &hex[0..6])),
            _ => None,
        };
    }

    if let Some(args) = v
        .strip_prefix("rgb(")
        .or_else(|| v.strip_prefix("rgba("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = args
            .split(',')
            .take(3)
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .map(|n| n.clamp(0, 255) as u8)
            .collect();
        if channels.len() != 3 {
            return None;
        }
        return Some(format!(
            "#{:02x}{:02x}{:02x}",
            channels[0], channels[1], channels[2]
        ));
    }

    let named = match v.as_str() {
        "black" => "#000000",
        "white" => "#ffffff",
        "red" => "#ff0000",
        "green" => "#008000",
        "blue" => "#0000ff",
        "yellow" => "#ffff00",
        "cyan" | "aqua" => "#00ffff",
        "magenta" | "fuchsia" => "#ff00ff",
        "orange" => "#ffa500",
        "purple" => "#800080",
        "pink" => "#ffc0cb",
        "gray" | "grey" => "#808080",
        "silver" => "#c0c0c0",
        "maroon" => "#800000",
        "olive" => "#808000",
        "lime" => "#00ff00",
        "teal" => "#008080",
        "navy" => "#000080",
        _ => return None,
    };
    Some(named.to_string())
}

/// A color in CIE Lab space (D65 white point).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        let r = srgb_to_linear(r);
        let g = srgb_to_linear(g);
        let b = srgb_to_linear(b);

        // sRGB D65 matrix, X and Z normalized by the reference white.
        let x = (0.4124 * r + 0.3576 * g + 0.1805 * b) / 0.95047;
        let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let z = (0.0193 * r + 0.1192 * g + 0.9505 * b) / 1.08883;

        let fx = lab_f(x);
        let fy = lab_f(y);
        let fz = lab_f(z);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let (r, g, b) = hex_to_rgb8(hex)?;
        Some(Self::from_rgb8(r, g, b))
    }
}

// IEC 61966-2-1 gamma decode.
fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

const EPSILON: f64 = 0.008856;
const KAPPA: f64 = 903.3;

fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

/// CIE94 color difference with graphic-arts weighting (kL=1, K1=0.045,
/// K2=0.015).
pub fn cie94(c1: Lab, c2: Lab) -> f64 {
    const K1: f64 = 0.045;
    const K2: f64 = 0.015;

    let delta_l = c1.l - c2.l;
    let chroma1 = (c1.a * c1.a + c1.b * c1.b).sqrt();
    let chroma2 = (c2.a * c2.a + c2.b * c2.b).sqrt();
    let delta_c = chroma1 - chroma2;
    let delta_a = c1.a - c2.a;
    let delta_b = c1.b - c2.b;
    let delta_h_sq = (delta_a * delta_a + delta_b * delta_b - delta_c * delta_c).max(0.0);

    let sc = 1.0 + K1 * chroma1;
    let sh = 1.0 + K2 * chroma1;

    (delta_l * delta_l + (delta_c / sc).powi(2) + delta_h_sq / (sh * sh)).sqrt()
}
