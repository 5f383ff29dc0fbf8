use serde::{Deserialize, Serialize};

/// Number of entries in the province palette, one per Turkish province.
pub const PROVINCE_COLOR_COUNT: usize = 81;

// Struct to represent a color
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Convert hue/saturation/brightness (all in 0..=1) to RGB.
    pub fn from_hsb(hue: f32, saturation: f32, brightness: f32) -> Self {
        let h = (hue.rem_euclid(1.0)) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));
        let v = brightness;

        let (r, g, b) = match sector as u32 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Color { r, g, b }
    }

    // Parse a color string in hex format (#RRGGBB)
    pub fn from_hex(color_str: &str) -> Option<Self> {
        let hex = color_str.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(hex.get(range)?, 16).ok().map(|c| c as f32 / 255.0)
        };
        Some(Color {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

/// Which palette a pipeline run colors features from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaletteKind {
    /// 81 procedurally generated HSB colors
    #[default]
    Provinces,
    /// A short fixed list of named colors
    Named,
}

const NAMED_COLORS: [(&str, &str); 12] = [
    ("red", "#FF3B30"),
    ("orange", "#FF9500"),
    ("yellow", "#FFCC00"),
    ("green", "#34C759"),
    ("mint", "#00C7BE"),
    ("teal", "#30B0C7"),
    ("cyan", "#32ADE6"),
    ("blue", "#007AFF"),
    ("indigo", "#5856D6"),
    ("purple", "#AF52DE"),
    ("pink", "#FF2D55"),
    ("brown", "#A2845E"),
];

/// An ordered color list indexed by feature ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<(String, Color)>,
}

impl Palette {
    pub fn for_kind(kind: PaletteKind) -> Self {
        match kind {
            PaletteKind::Provinces => Self::provinces(),
            PaletteKind::Named => Self::named(),
        }
    }

    /// Hue walks the spectrum while saturation cycles through 0.7/0.8/0.9
    /// and brightness through 0.6..=0.9, so neighbours stay distinguishable.
    pub fn provinces() -> Self {
        let colors = (0..PROVINCE_COLOR_COUNT)
            .map(|i| {
                let hue = i as f32 / PROVINCE_COLOR_COUNT as f32;
                let saturation = 0.7 + (i % 3) as f32 * 0.1;
                let brightness = 0.6 + (i % 4) as f32 * 0.1;
                (format!("province-{}", i), Color::from_hsb(hue, saturation, brightness))
            })
            .collect();
        Palette { colors }
    }

    pub fn named() -> Self {
        let colors = NAMED_COLORS
            .iter()
            .filter_map(|(name, hex)| Color::from_hex(hex).map(|c| (name.to_string(), c)))
            .collect();
        Palette { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Palette slot for a feature ordinal.
    pub fn color_index(&self, ordinal: usize) -> usize {
        ordinal % self.colors.len().max(1)
    }

    pub fn color(&self, index: usize) -> Color {
        self.colors
            .get(index % self.colors.len().max(1))
            .map(|(_, c)| *c)
            .unwrap_or(Color { r: 0.7, g: 0.7, b: 0.7 })
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.colors
            .get(index % self.colors.len().max(1))
            .map(|(n, _)| n.as_str())
    }
}
