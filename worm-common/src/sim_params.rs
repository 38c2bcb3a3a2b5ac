use crate::canvas::Hsl;
use crate::vecmath::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

/// Bounds the live thickness slider accepts.
pub const MAX_THICKNESS_LIMITS: (f32, f32) = (1.0, 80.0);
/// Bounds the live spacing slider accepts.
pub const MAX_SPACING_LIMITS: (f32, f32) = (1.0, 20.0);

/// The seven-colour palette the worms are tinted from.
pub const DEFAULT_PALETTE: [Hsl; 7] = [
    Hsl::new(349.0, 99.0, 63.0), // #FE4365
    Hsl::new(25.0, 86.0, 83.0),  // #F9CDAE
    Hsl::new(177.0, 42.0, 76.0), // #A8DCD9
    Hsl::new(350.0, 65.0, 46.0), // #C02A43
    Hsl::new(185.0, 19.0, 40.0), // #537679
    Hsl::new(46.0, 75.0, 70.0),  // #ECD179
    Hsl::new(153.0, 22.0, 60.0), // #83AF9B
];

/// Size of the visible area. Worms whose bounds leave it are steered back to its centre.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Simulation parameters derived from the configuration, read at setup and on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    pub num_worms: u32,
    pub min_length: f32,
    pub max_length: f32,
    pub min_thickness: f32,
    pub max_thickness: f32,
    pub min_spacing: f32,
    pub max_spacing: f32,
    pub shadow: bool,
    pub palette: Vec<Hsl>,
    /// Advance worms on the rayon pool instead of one after another.
    pub parallel: bool,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            num_worms: 40,
            min_length: 5.0,
            max_length: 35.0,
            min_thickness: 12.0,
            max_thickness: 20.0,
            min_spacing: 1.0,
            max_spacing: 4.0,
            shadow: true,
            palette: DEFAULT_PALETTE.to_vec(),
            parallel: true,
        }
    }
}

/// Replacement values for any subset of [`SimParams`], applied between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamOverrides {
    #[serde(default)]
    pub num_worms: Option<u32>,
    #[serde(default)]
    pub min_length: Option<f32>,
    #[serde(default)]
    pub max_length: Option<f32>,
    #[serde(default)]
    pub min_thickness: Option<f32>,
    #[serde(default)]
    pub max_thickness: Option<f32>,
    #[serde(default)]
    pub min_spacing: Option<f32>,
    #[serde(default)]
    pub max_spacing: Option<f32>,
    #[serde(default)]
    pub shadow: Option<bool>,
    #[serde(default)]
    pub palette: Option<Vec<[f32; 3]>>,
}

impl SimParams {
    /// Applies every override that is set, then clamps the result back into a usable state.
    pub fn apply(&mut self, overrides: &ParamOverrides) {
        if let Some(n) = overrides.num_worms {
            self.num_worms = n;
        }
        if let Some(v) = overrides.min_length {
            self.min_length = v;
        }
        if let Some(v) = overrides.max_length {
            self.max_length = v;
        }
        if let Some(v) = overrides.min_thickness {
            self.min_thickness = v;
        }
        if let Some(v) = overrides.max_thickness {
            self.set_max_thickness(v);
        }
        if let Some(v) = overrides.min_spacing {
            self.min_spacing = v;
        }
        if let Some(v) = overrides.max_spacing {
            self.set_max_spacing(v);
        }
        if let Some(shadow) = overrides.shadow {
            self.shadow = shadow;
        }
        if let Some(palette) = &overrides.palette {
            if palette.is_empty() {
                warn!("Ignoring empty palette override.");
            } else {
                self.palette = palette.iter().copied().map(Hsl::from).collect();
            }
        }
        self.sanitize();
    }

    pub fn set_max_thickness(&mut self, value: f32) {
        self.max_thickness = value.clamp(MAX_THICKNESS_LIMITS.0, MAX_THICKNESS_LIMITS.1);
    }

    pub fn set_max_spacing(&mut self, value: f32) {
        self.max_spacing = value.clamp(MAX_SPACING_LIMITS.0, MAX_SPACING_LIMITS.1);
    }

    /// Raises any range maximum that fell below its minimum, keeps spacing positive and
    /// restores the default palette if none is set.
    pub fn sanitize(&mut self) {
        if self.palette.is_empty() {
            warn!("Palette is empty, using the default colours.");
            self.palette = DEFAULT_PALETTE.to_vec();
        }
        if self.min_spacing <= 0.0 {
            warn!("min_spacing {} is not positive, using {}.", self.min_spacing, MAX_SPACING_LIMITS.0);
            self.min_spacing = MAX_SPACING_LIMITS.0;
        }
        for (name, min, max) in [
            ("length", self.min_length, &mut self.max_length),
            ("thickness", self.min_thickness, &mut self.max_thickness),
            ("spacing", self.min_spacing, &mut self.max_spacing),
        ] {
            if *max < min {
                warn!("max {} ({:.2}) is below min ({:.2}), clamping.", name, *max, min);
                *max = min;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_palette_falls_back_to_default() {
        let mut params = SimParams { palette: Vec::new(), ..SimParams::default() };
        params.sanitize();
        assert_eq!(params.palette, DEFAULT_PALETTE.to_vec());
    }

    #[test]
    fn viewport_center_is_half_size() {
        assert_eq!(Viewport::new(800.0, 600.0).center(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn overrides_only_touch_given_fields() {
        let mut params = SimParams::default();
        params.apply(&ParamOverrides {
            max_thickness: Some(40.0),
            shadow: Some(false),
            ..Default::default()
        });
        assert_eq!(params.max_thickness, 40.0);
        assert!(!params.shadow);
        assert_eq!(params.max_spacing, SimParams::default().max_spacing);
        assert_eq!(params.palette.len(), DEFAULT_PALETTE.len());
    }

    #[test]
    fn live_limits_are_clamped() {
        let mut params = SimParams::default();
        params.set_max_thickness(500.0);
        params.set_max_spacing(0.0);
        assert_eq!(params.max_thickness, 80.0);
        assert_eq!(params.max_spacing, 1.0);
    }

    #[test]
    fn inverted_ranges_are_repaired() {
        let mut params = SimParams::default();
        params.apply(&ParamOverrides {
            min_length: Some(50.0),
            min_thickness: Some(90.0),
            palette: Some(vec![]),
            ..Default::default()
        });
        assert_eq!(params.max_length, 50.0);
        assert_eq!(params.max_thickness, 90.0);
        assert!(!params.palette.is_empty());
    }
}
