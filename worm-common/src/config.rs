use crate::canvas::Hsl;
use crate::sim_params::{ParamOverrides, SimParams, Viewport, DEFAULT_PALETTE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Size of the visible area at startup
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig { width: 800.0, height: 600.0 }
    }
}

// Population and body plan, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WormParamsConfig {
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_min_length")]
    pub min_length: f32,
    #[serde(default = "default_max_length")]
    pub max_length: f32,
    #[serde(default = "default_min_thickness")]
    pub min_thickness: f32,
    #[serde(default = "default_max_thickness")]
    pub max_thickness: f32,
    #[serde(default = "default_min_spacing")]
    pub min_spacing: f32,
    #[serde(default = "default_max_spacing")]
    pub max_spacing: f32,
    #[serde(default = "default_true")]
    pub shadow: bool,
    /// Base colours as `[hue, saturation %, lightness %]`.
    #[serde(default = "default_palette")]
    pub palette: Vec<[f32; 3]>,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for WormParamsConfig {
    fn default() -> Self {
        WormParamsConfig {
            count: default_count(),
            min_length: default_min_length(),
            max_length: default_max_length(),
            min_thickness: default_min_thickness(),
            max_thickness: default_max_thickness(),
            min_spacing: default_min_spacing(),
            max_spacing: default_max_spacing(),
            shadow: true,
            palette: default_palette(),
            parallel: true,
        }
    }
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub total_ticks: u32,
    /// Keep a snapshot every this many ticks.
    pub record_interval: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig { total_ticks: 1200, record_interval: 2 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct InitialConditions {
    #[serde(default)]
    pub seed: u64,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_snapshots: bool,
    pub save_positions: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "worms".to_string(),
            save_snapshots: true,
            save_positions: false,
            format: None,
        }
    }
}

/// Something the host does between ticks, the way a person at the control panel would.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScheduledAction {
    Refresh {
        #[serde(flatten)]
        overrides: ParamOverrides,
    },
    Resize { width: f32, height: f32 },
    Toggle,
    SetShadow { enabled: bool },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub tick: u32,
    #[serde(flatten)]
    pub action: ScheduledAction,
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct WormsConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub worms: WormParamsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub schedule: Vec<ScheduledEvent>,
}

impl WormsConfig {
    /// Loads the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: WormsConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let worms = &self.worms;
        if worms.count == 0 {
            anyhow::bail!("worms.count must be greater than 0.");
        }
        if worms.palette.is_empty() {
            anyhow::bail!("worms.palette must contain at least one colour.");
        }
        if worms.min_length < 1.0 {
            anyhow::bail!("worms.min_length must be at least 1.");
        }
        if worms.min_spacing <= 0.0 {
            anyhow::bail!("worms.min_spacing must be positive.");
        }
        if worms.min_thickness <= 0.0 {
            anyhow::bail!("worms.min_thickness must be positive.");
        }
        for (name, min, max) in [
            ("length", worms.min_length, worms.max_length),
            ("thickness", worms.min_thickness, worms.max_thickness),
            ("spacing", worms.min_spacing, worms.max_spacing),
        ] {
            if max < min {
                anyhow::bail!("worms.max_{name} ({max}) is below worms.min_{name} ({min}).");
            }
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            anyhow::bail!("viewport dimensions must be positive.");
        }
        if self.timing.record_interval == 0 {
            anyhow::bail!("timing.record_interval must be greater than 0.");
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }

    /// Converts the configuration into the parameters the simulation reads at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let worms = &self.worms;
        SimParams {
            num_worms: worms.count,
            min_length: worms.min_length,
            max_length: worms.max_length,
            min_thickness: worms.min_thickness,
            max_thickness: worms.max_thickness,
            min_spacing: worms.min_spacing,
            max_spacing: worms.max_spacing,
            shadow: worms.shadow,
            palette: worms.palette.iter().copied().map(Hsl::from).collect(),
            parallel: worms.parallel,
        }
    }
}

fn default_count() -> u32 {
    40
}

fn default_min_length() -> f32 {
    5.0
}

fn default_max_length() -> f32 {
    35.0
}

fn default_min_thickness() -> f32 {
    12.0
}

fn default_max_thickness() -> f32 {
    20.0
}

fn default_min_spacing() -> f32 {
    1.0
}

fn default_max_spacing() -> f32 {
    4.0
}

fn default_true() -> bool {
    true
}

fn default_palette() -> Vec<[f32; 3]> {
    DEFAULT_PALETTE
        .iter()
        .map(|c| [c.hue, c.saturation, c.lightness])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_sketch_defaults() {
        let config = WormsConfig::from_toml("").unwrap();
        assert_eq!(config.get_sim_params(), SimParams::default());
        assert_eq!(config.viewport(), Viewport::new(800.0, 600.0));
    }

    #[test]
    fn parses_sections_and_schedule() {
        let config = WormsConfig::from_toml(
            r#"
            [viewport]
            width = 1024
            height = 768

            [worms]
            count = 3
            max_spacing = 8
            shadow = false
            palette = [[10, 50, 50]]

            [timing]
            total_ticks = 100
            record_interval = 5

            [initial_conditions]
            seed = 7

            [[schedule]]
            tick = 10
            action = "refresh"
            max_thickness = 40

            [[schedule]]
            tick = 20
            action = "resize"
            width = 640
            height = 480

            [[schedule]]
            tick = 30
            action = "toggle"
            "#,
        )
        .unwrap();

        assert_eq!(config.viewport(), Viewport::new(1024.0, 768.0));
        let params = config.get_sim_params();
        assert_eq!(params.num_worms, 3);
        assert_eq!(params.max_spacing, 8.0);
        assert!(!params.shadow);
        assert_eq!(params.palette, vec![Hsl::new(10.0, 50.0, 50.0)]);
        assert_eq!(config.initial_conditions.seed, 7);
        assert_eq!(config.schedule.len(), 3);
        assert_eq!(
            config.schedule[0].action,
            ScheduledAction::Refresh {
                overrides: ParamOverrides { max_thickness: Some(40.0), ..Default::default() }
            }
        );
        assert_eq!(
            config.schedule[1].action,
            ScheduledAction::Resize { width: 640.0, height: 480.0 }
        );
        assert_eq!(config.schedule[2].action, ScheduledAction::Toggle);
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = WormsConfig::from_toml("[worms]\nmin_spacing = 5\nmax_spacing = 2\n").unwrap_err();
        assert!(err.to_string().contains("spacing"));
    }

    #[test]
    fn rejects_empty_population() {
        assert!(WormsConfig::from_toml("[worms]\ncount = 0\n").is_err());
        assert!(WormsConfig::from_toml("[worms]\npalette = []\n").is_err());
    }
}
