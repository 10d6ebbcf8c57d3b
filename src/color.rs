//! Named color matching for annotation tagging.
//!
//! Raw annotation colors are snapped to the closest entry of a fixed palette,
//! and the palette name is then mapped to a tag through [`ExtractConfig`].

use crate::config::ExtractConfig;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert a PDF color array to RGB.
    ///
    /// One component is gray, three are RGB and four are CMYK. Any other
    /// length (including the empty "transparent" array) yields `None`.
    pub fn from_components(components: &[f32]) -> Option<Self> {
        let clamp = |v: f32| v.clamp(0.0, 1.0);
        match *components {
            [gray] => Some(Self::new(clamp(gray), clamp(gray), clamp(gray))),
            [r, g, b] => Some(Self::new(clamp(r), clamp(g), clamp(b))),
            [c, m, y, k] => {
                let k = clamp(k);
                Some(Self::new(
                    (1.0 - clamp(c)) * (1.0 - k),
                    (1.0 - clamp(m)) * (1.0 - k),
                    (1.0 - clamp(y)) * (1.0 - k),
                ))
            }
            _ => None,
        }
    }

    fn distance(&self, other: &Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Palette used for matching, in iteration order.
pub const PALETTE: &[(&str, Rgb)] = &[
    ("red", Rgb::new(1.0, 0.0, 0.0)),
    ("green", Rgb::new(0.0, 1.0, 0.0)),
    ("blue", Rgb::new(0.0, 0.0, 1.0)),
    ("yellow", Rgb::new(1.0, 1.0, 0.0)),
    ("purple", Rgb::new(0.5, 0.0, 0.5)),
    ("orange", Rgb::new(1.0, 0.65, 0.0)),
    ("cyan", Rgb::new(0.0, 1.0, 1.0)),
    ("magenta", Rgb::new(1.0, 0.0, 1.0)),
    ("pink", Rgb::new(1.0, 0.75, 0.8)),
];

/// Look up a palette color by name.
pub fn palette_color(name: &str) -> Option<Rgb> {
    PALETTE
        .iter()
        .find(|(palette_name, _)| *palette_name == name)
        .map(|(_, rgb)| *rgb)
}

/// Similarity of two colors.
///
/// `1 - distance / 3`: identical colors score 1, black against white scores
/// about 0.423. The score is not renormalized, so thresholds stay comparable
/// with existing configurations.
pub fn similarity(a: &Rgb, b: &Rgb) -> f64 {
    1.0 - a.distance(b) / 3.0
}

/// Name of the palette color closest to `color`.
///
/// The running best starts at `threshold`; a palette entry wins when its
/// similarity is greater than or equal to the best so far. Returns `None`
/// when no entry reaches the threshold.
pub fn nearest_color(color: &Rgb, threshold: f64) -> Option<&'static str> {
    let mut best = threshold;
    let mut nearest = None;
    for (name, candidate) in PALETTE {
        let score = similarity(candidate, color);
        if score >= best {
            best = score;
            nearest = Some(*name);
        }
    }
    nearest
}

/// Tag for `color` under `config`, or an empty string.
pub fn resolve_tag(color: &Rgb, config: &ExtractConfig) -> String {
    nearest_color(color, config.minimum_similarity_color)
        .and_then(|name| config.tag_for(name))
        .unwrap_or_default()
        .to_string()
}
