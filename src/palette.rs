//! Fixed drawing palettes and nearest-entry color matching.

use std::collections::BTreeMap;

use crate::color::{cie94, Lab, PaletteColor};
use crate::error::PixvecError;

/// Palettes are capped by the downstream editor's color slots.
pub const MAX_PALETTE: usize = 64;

/// ΔE above which a palette snap is an obvious color shift.
pub const DELTA_E_WARN: f64 = 15.0;

/// The AAP-64 palette, the editor's reference palette.
const AAP64_HEX: [&str; 64] = [
    "#060608", "#141013", "#3b1725", "#73172d", "#b4202a", "#df3e23", "#fa6a0a", "#f9a31b",
    "#ffd541", "#fffc40", "#d6f264", "#9cdb43", "#59c135", "#14a02e", "#1a7a3e", "#24523b",
    "#122020", "#143464", "#285cc4", "#249fde", "#20d6c7", "#a6fcdb", "#ffffff", "#fef3c0",
    "#fad6b8", "#f5a097", "#e86a73", "#bc4a9b", "#793a80", "#403353", "#242234", "#221c1a",
    "#322b28", "#71413b", "#bb7547", "#dba463", "#f4d29c", "#dae0ea", "#b3b9d1", "#8b93af",
    "#6d758d", "#4a5462", "#333941", "#422433", "#5b3138", "#8e5252", "#ba756a", "#e9b5a3",
    "#e3e6ff", "#b9bffb", "#849be4", "#588dbe", "#477d85", "#23674e", "#328464", "#5daf8d",
    "#92dcba", "#cdf7e2", "#e4d2aa", "#c7b08b", "#a08662", "#796755", "#5a4e44", "#423934",
];

/// An ordered drawing palette: parallel hex and color arrays with stable
/// indices.
#[derive(Debug, Clone)]
pub struct Palette {
    pub hex: Vec<String>,
    pub colors: Vec<PaletteColor>,
}

impl Palette {
    /// The default AAP-64 palette.
    pub fn aap64() -> Self {
        let hex: Vec<String> = AAP64_HEX.iter().map(|s| s.to_string()).collect();
        let colors = hex
            .iter()
            .filter_map(|h| PaletteColor::from_hex(h))
            .collect();
        Self { hex, colors }
    }

    /// Build a palette from normalized hex strings.
    pub fn from_hex_list(list: &[String]) -> Result<Self, PixvecError> {
        if list.is_empty() {
            return Err(PixvecError::InvalidPalette("palette is empty".into()));
        }
        if list.len() > MAX_PALETTE {
            return Err(PixvecError::InvalidPalette(format!(
                "palette has {} entries, max is {}",
                list.len(),
                MAX_PALETTE
            )));
        }
        let mut hex = Vec::with_capacity(list.len());
        let mut colors = Vec::with_capacity(list.len());
        for entry in list {
            let normalized = crate::color::normalize(entry).ok_or_else(|| {
                PixvecError::InvalidPalette(format!("unrecognized palette color '{entry}'"))
            })?;
            let color = PaletteColor::from_hex(&normalized).ok_or_else(|| {
                PixvecError::InvalidPalette(format!("unrecognized palette color '{entry}'"))
            })?;
            hex.push(normalized);
            colors.push(color);
        }
        Ok(Self { hex, colors })
    }

    pub fn len(&self) -> usize {
        self.hex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hex.is_empty()
    }
}

/// The palette entry chosen for one distinct input color.
#[derive(Debug, Clone)]
pub struct ColorMatch {
    pub index: usize,
    pub hex: String,
    pub color: PaletteColor,
    pub delta_e: f64,
}

/// Snap every distinct input color to its nearest palette entry under
/// CIE94. Ties break to the lowest palette index. A ΔE above
/// [`DELTA_E_WARN`] appends a warning.
pub fn match_colors(
    inputs: &[String],
    palette: &Palette,
    warnings: &mut Vec<String>,
) -> BTreeMap<String, ColorMatch> {
    let palette_lab: Vec<Option<Lab>> = palette.hex.iter().map(|h| Lab::from_hex(h)).collect();

    let mut mapping = BTreeMap::new();
    for input in inputs {
        let Some(input_lab) = Lab::from_hex(input) else {
            continue;
        };

        let mut best: Option<(usize, f64)> = None;
        for (i, lab) in palette_lab.iter().enumerate() {
            let Some(lab) = lab else { continue };
            let d = cie94(input_lab, *lab);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }

        let Some((index, delta_e)) = best else { continue };
        if delta_e > DELTA_E_WARN {
            let message = format!(
                "color {} maps to palette {} with high color distance ({:.1})",
                input, palette.hex[index], delta_e
            );
            log::warn!("{message}");
            warnings.push(message);
        }
        mapping.insert(
            input.clone(),
            ColorMatch {
                index,
                hex: palette.hex[index].clone(),
                color: palette.colors[index],
                delta_e,
            },
        );
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aap64_shape() {
        let p = Palette::aap64();
        assert_eq!(p.len(), 64);
        assert_eq!(p.colors.len(), 64);
        assert!(p.hex.iter().all(|h| h.len() == 7 && h.starts_with('#')));
    }

    #[test]
    fn test_exact_hex_matches_itself() {
        let p = Palette::aap64();
        let mut warnings = Vec::new();
        let mapping = match_colors(&["#ffffff".to_string()], &p, &mut warnings);
        let m = &mapping["#ffffff"];
        assert_eq!(m.hex, "#ffffff");
        assert!(m.delta_e < 1e-6);
        assert_eq!(m.index, p.hex.iter().position(|h| h == "#ffffff").unwrap());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_pure_red_snaps_close() {
        let p = Palette::aap64();
        let mut warnings = Vec::new();
        let mapping = match_colors(&["#ff0000".to_string()], &p, &mut warnings);
        let m = &mapping["#ff0000"];
        assert!(m.hex == "#df3e23" || m.hex == "#b4202a", "got {}", m.hex);
        assert!(m.delta_e < DELTA_E_WARN);
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let p = Palette::from_hex_list(&["#808080".into(), "#808080".into()]).unwrap();
        let mut warnings = Vec::new();
        let mapping = match_colors(&["#808080".to_string()], &p, &mut warnings);
        assert_eq!(mapping["#808080"].index, 0);
    }

    #[test]
    fn test_high_delta_warns() {
        let p = Palette::from_hex_list(&["#000000".into()]).unwrap();
        let mut warnings = Vec::new();
        let mapping = match_colors(&["#00ff00".to_string()], &p, &mut warnings);
        assert!(mapping["#00ff00"].delta_e > DELTA_E_WARN);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_palette_size_cap() {
        let list: Vec<String> = (0..65).map(|i| format!("#{:06x}", i * 1000)).collect();
        assert!(Palette::from_hex_list(&list).is_err());
        assert!(Palette::from_hex_list(&[]).is_err());
    }

    #[test]
    fn test_all_mapping_deltas_nonnegative() {
        let p = Palette::aap64();
        let inputs: Vec<String> = ["#123456", "#fedcba", "#777777"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut warnings = Vec::new();
        for m in match_colors(&inputs, &p, &mut warnings).values() {
            assert!(m.delta_e >= 0.0);
        }
    }
}
