use std::collections::HashMap;
use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Character;

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

/// Parse `#rrggbb` / `rrggbb` (also the `#rgb` short form).
pub fn parse_hex(hex: &str) -> Option<Color32> {
    let rgb = Srgb::<u8>::from_str(hex.trim()).ok()?;
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

// ---------------------------------------------------------------------------
// Character colours: id → Color32
// ---------------------------------------------------------------------------

/// The colour of every character, used by the selector, the legend and the
/// chart alike. Characters whose `color` does not parse get a generated one.
#[derive(Debug, Clone, Default)]
pub struct CharacterColors {
    mapping: HashMap<String, Color32>,
    default_color: Color32,
}

impl CharacterColors {
    pub fn new(characters: &[Character]) -> Self {
        let mut fallback = generate_palette(characters.len()).into_iter();
        let mapping = characters
            .iter()
            .map(|c| {
                let generated = fallback.next().unwrap_or(Color32::GRAY);
                let color = parse_hex(&c.color).unwrap_or_else(|| {
                    log::warn!("Character '{}' has invalid colour {:?}", c.id, c.color);
                    generated
                });
                (c.id.clone(), color)
            })
            .collect();

        CharacterColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, character_id: &str) -> Color32 {
        self.mapping
            .get(character_id)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: &str, color: &str) -> Character {
        Character {
            id: id.to_string(),
            name: id.to_string(),
            name_en: None,
            description: String::new(),
            debut_year: 2000,
            color: color.to_string(),
            image_url: None,
        }
    }

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(parse_hex("#ff6fa5"), Some(Color32::from_rgb(0xff, 0x6f, 0xa5)));
        assert_eq!(parse_hex("00ff00"), Some(Color32::from_rgb(0, 0xff, 0)));
        assert_eq!(parse_hex("pink"), None);
    }

    #[test]
    fn invalid_colours_fall_back_to_palette() {
        let chars = vec![character("a", "#000000"), character("b", "nope")];
        let colors = CharacterColors::new(&chars);
        assert_eq!(colors.color_for("a"), Color32::from_rgb(0, 0, 0));
        assert_eq!(colors.color_for("b"), generate_palette(2)[1]);
        assert_eq!(colors.color_for("missing"), Color32::GRAY);
    }
}
