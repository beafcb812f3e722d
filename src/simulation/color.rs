use rand::Rng;

use crate::config::COLOR_PROBABILITY;

/// Color token carried by a live cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Default color of a live cell that did not draw a palette hue
    pub const WHITE: Rgb = Rgb::from_hex(0xffffff);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Saturated hues a newborn cell may pick up
pub const PALETTE: [Rgb; 10] = [
    Rgb::from_hex(0xff0000), // Red
    Rgb::from_hex(0x00ff00), // Green
    Rgb::from_hex(0x0000ff), // Blue
    Rgb::from_hex(0xffff00), // Yellow
    Rgb::from_hex(0xff00ff), // Magenta
    Rgb::from_hex(0x00ffff), // Cyan
    Rgb::from_hex(0xff8000), // Orange
    Rgb::from_hex(0x8000ff), // Purple
    Rgb::from_hex(0x00ff80), // Mint
    Rgb::from_hex(0xff0080), // Pink
];

/// Weighted draw used whenever a cell comes alive.
///
/// With `probability` the cell gets a uniformly chosen [`PALETTE`] hue,
/// otherwise it is [`Rgb::WHITE`]. The draw is decorative only; nothing in
/// the transition rule reads it back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorDraw {
    probability: f64,
}

impl ColorDraw {
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> Rgb {
        if rng.gen_bool(self.probability) {
            PALETTE[rng.gen_range(0..PALETTE.len())]
        } else {
            Rgb::WHITE
        }
    }
}

impl Default for ColorDraw {
    fn default() -> Self {
        Self::new(COLOR_PROBABILITY)
    }
}
