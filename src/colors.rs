use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }

    pub fn css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

// Density gradient stops
pub const LOW: Rgb = Rgb::new(0, 255, 255);    // Cyan
pub const MID: Rgb = Rgb::new(255, 255, 0);    // Yellow
pub const HIGH: Rgb = Rgb::new(255, 0, 0);     // Red

#[inline]
fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).floor() as u8
}

fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    Rgb::new(lerp_channel(a.r, b.r, t), lerp_channel(a.g, b.g, t), lerp_channel(a.b, b.b, t))
}

/// Map a normalized density (clamped to 0..=1) onto cyan -> yellow -> red
pub fn gradient(ratio: f64) -> Rgb {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    if ratio < 0.5 {
        lerp(LOW, MID, ratio * 2.0)
    } else {
        lerp(MID, HIGH, (ratio - 0.5) * 2.0)
    }
}

/// Color for a bin holding `value` points when `max_value` saturates the scale
pub fn density_color(value: f64, max_value: f64) -> Rgb {
    if max_value <= 0.0 {
        return if value > 0.0 { HIGH } else { LOW };
    }
    gradient(value / max_value)
}

/// Visual-only tint for hidden nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HiddenTint {
    Cyan,
    Violet,
}

impl HiddenTint {
    pub const ALL: [HiddenTint; 2] = [HiddenTint::Cyan, HiddenTint::Violet];

    /// Normalized vertex color
    pub fn rgb_f32(&self) -> [f32; 3] {
        match self {
            HiddenTint::Cyan => [0.0, 1.0, 1.0],
            HiddenTint::Violet => [0.8, 0.2, 1.0],
        }
    }

    pub fn to_color(&self) -> Color {
        let [r, g, b] = self.rgb_f32();
        Color::Rgb {
            r: (r * 255.0) as u8,
            g: (g * 255.0) as u8,
            b: (b * 255.0) as u8,
        }
    }
}
