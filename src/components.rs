use anyhow::{Context, Result, ensure};

/// Bounds of the viewport box, in NDC-like units on both axes.
pub const BOUNDS: f32 = 1.0;

/// Palette cycled by the color commands.
pub const COLOR_PALETTE: &[&str] = &[
    "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF", "#FFFFFF", "#808080",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    pub position: [f32; 2],
    pub velocity: [f32; 2], // units per tick
    pub gravity_enabled: bool,
}

impl Kinematics {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0],
            velocity: [0.0, 0.0],
            gravity_enabled: true,
        }
    }

    pub fn with_position(mut self, position: [f32; 2]) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: [f32; 2]) -> Self {
        self.velocity = velocity;
        self
    }
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub angles: [f32; 3], // radians, x/y/z
    pub active: [bool; 3],
}

impl Orientation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, axis: Axis) {
        let i = axis as usize;
        self.active[i] = !self.active[i];
    }

    pub fn is_active(&self, axis: Axis) -> bool {
        self.active[axis as usize]
    }

    pub fn angle(&self, axis: Axis) -> f32 {
        self.angles[axis as usize]
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub object_color: [f32; 4],  // RGBA
    pub ambient_color: [f32; 3], // RGB
    pub diffuse_color: [f32; 3],
    pub light_direction: [f32; 3],
}

impl Appearance {
    pub fn new() -> Self {
        Self {
            object_color: [1.0, 0.0, 0.0, 1.0],
            ambient_color: [0.5, 0.5, 0.5],
            diffuse_color: [1.0, 1.0, 1.0],
            light_direction: [0.0, 0.0, 1.0],
        }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    #[default]
    Cube,
    Sphere,
    Pyramid,
}

impl ShapeKind {
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Cube => "cube",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Pyramid => "pyramid",
        }
    }
}

/// UV sphere parameters. Band counts stay within `MIN_BANDS..=MAX_BANDS`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereParams {
    pub latitude_bands: u32,
    pub longitude_bands: u32,
    pub radius: f32,
}

impl SphereParams {
    pub const MIN_BANDS: u32 = 3;
    pub const MAX_BANDS: u32 = 128;

    pub fn new(latitude_bands: u32, longitude_bands: u32, radius: f32) -> Self {
        Self {
            latitude_bands: latitude_bands.clamp(Self::MIN_BANDS, Self::MAX_BANDS),
            longitude_bands: longitude_bands.clamp(Self::MIN_BANDS, Self::MAX_BANDS),
            radius,
        }
    }

    /// Adds `delta` to both band counts, saturating at the limits.
    pub fn with_band_delta(self, delta: i32) -> Self {
        let shift = |bands: u32| bands.saturating_add_signed(delta);
        Self::new(
            shift(self.latitude_bands),
            shift(self.longitude_bands),
            self.radius,
        )
    }

    pub fn vertex_count(&self) -> usize {
        (self.latitude_bands as usize + 1) * (self.longitude_bands as usize + 1)
    }
}

impl Default for SphereParams {
    fn default() -> Self {
        Self::new(30, 30, 0.5)
    }
}

/// Parses `#RRGGBB` into normalized RGBA with alpha 1.0.
pub fn hex_to_rgb(hex: &str) -> Result<[f32; 4]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    ensure!(
        digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()),
        "expected a #RRGGBB color, got {hex:?}"
    );

    let value =
        u32::from_str_radix(digits, 16).with_context(|| format!("invalid hex color {hex:?}"))?;

    let r = (value >> 16) & 0xFF;
    let g = (value >> 8) & 0xFF;
    let b = value & 0xFF;

    Ok([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── hex_to_rgb ────────────────────────────────────────────────────────

    #[test]
    fn hex_red_is_unit_red() {
        assert_eq!(hex_to_rgb("#FF0000").unwrap(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn hex_black_keeps_full_alpha() {
        assert_eq!(hex_to_rgb("#000000").unwrap(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn hex_lowercase_and_mid_values() {
        let c = hex_to_rgb("#80ff00").unwrap();
        assert!((c[0] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c[1], 1.0);
        assert_eq!(c[2], 0.0);
    }

    #[test]
    fn hex_rejects_malformed_input() {
        assert!(hex_to_rgb("#FFF").is_err());
        assert!(hex_to_rgb("#GG0000").is_err());
        assert!(hex_to_rgb("").is_err());
        assert!(hex_to_rgb("#+12345").is_err());
    }

    #[test]
    fn palette_entries_all_parse() {
        for hex in COLOR_PALETTE {
            assert!(hex_to_rgb(hex).is_ok(), "{hex}");
        }
    }

    // ── orientation ───────────────────────────────────────────────────────

    #[test]
    fn toggle_flips_only_one_axis() {
        let mut o = Orientation::new();
        o.toggle(Axis::Y);
        assert!(!o.is_active(Axis::X));
        assert!(o.is_active(Axis::Y));
        assert!(!o.is_active(Axis::Z));
        o.toggle(Axis::Y);
        assert!(!o.is_active(Axis::Y));
    }

    // ── sphere params ─────────────────────────────────────────────────────

    #[test]
    fn sphere_defaults_give_961_points() {
        assert_eq!(SphereParams::default().vertex_count(), 961);
    }

    #[test]
    fn band_delta_saturates_at_limits() {
        let low = SphereParams::new(3, 3, 0.5).with_band_delta(-5);
        assert_eq!(low.latitude_bands, SphereParams::MIN_BANDS);

        let high = SphereParams::new(128, 128, 0.5).with_band_delta(1);
        assert_eq!(high.longitude_bands, SphereParams::MAX_BANDS);
    }
}
