use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

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
// Color mapping: status value → Color32
// ---------------------------------------------------------------------------

/// Maps each unique status value to a distinct colour, so the status
/// distribution chart and the record table agree.
#[derive(Debug, Clone)]
pub struct StatusColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl StatusColors {
    /// Build the mapping from the dataset's unique status values.
    pub fn new(statuses: &BTreeSet<String>) -> Self {
        let palette = generate_palette(statuses.len());
        let mapping: BTreeMap<String, Color32> = statuses
            .iter()
            .zip(palette.into_iter())
            .map(|(s, c): (&String, Color32)| (s.clone(), c))
            .collect();

        StatusColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a status value.
    pub fn color_for(&self, status: &str) -> Color32 {
        self.mapping
            .get(status)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_size_matches_request() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(7).len(), 7);
    }

    #[test]
    fn statuses_get_distinct_colors() {
        let statuses: BTreeSet<String> =
            ["Open", "Closed", "In review"].iter().map(|s| s.to_string()).collect();
        let colors = StatusColors::new(&statuses);
        let open = colors.color_for("Open");
        let closed = colors.color_for("Closed");
        assert_ne!(open, closed);
        // Unknown values fall back to the default.
        assert_eq!(colors.color_for("Archived"), Color32::GRAY);
    }
}
