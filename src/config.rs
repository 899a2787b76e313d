use std::fs;
use std::ops::RangeInclusive;
use std::path::Path as FsPath;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Point;
use crate::path::PathConfig;
use crate::smoothing::{SmoothingConfig, MAX_DENSITY};

/// Half-open integer range `[min, max)` as it appears in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSetting {
    pub min: usize,
    pub max: usize,
}

impl RangeSetting {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn to_range(self) -> std::ops::Range<usize> {
        self.min..self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalSettings {
    pub base_secs: f64,
    pub jitter_secs: f64,
}

impl Default for IntervalSettings {
    fn default() -> Self {
        Self {
            base_secs: 5.0,
            jitter_secs: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub node_floor: RangeSetting,
    pub node_ceiling: RangeSetting,
    pub variance: RangeSetting,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            node_floor: RangeSetting::new(2, 7),
            node_ceiling: RangeSetting::new(10, 15),
            variance: RangeSetting::new(7, 12),
        }
    }
}

impl PathSettings {
    pub fn to_path_config(&self) -> PathConfig {
        PathConfig {
            node_floor: self.node_floor.to_range(),
            node_ceiling: self.node_ceiling.to_range(),
            variance: self.variance.to_range(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitSettings {
    /// Pause between consecutive path nodes.
    pub step_delay_ms_min: u64,
    pub step_delay_ms_max: u64,
}

impl Default for EmitSettings {
    fn default() -> Self {
        Self {
            step_delay_ms_min: 4,
            step_delay_ms_max: 12,
        }
    }
}

impl EmitSettings {
    pub fn step_delay_ms(&self) -> RangeInclusive<u64> {
        self.step_delay_ms_min..=self.step_delay_ms_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    pub enabled: bool,
    pub screen_width: u32,
    pub screen_height: u32,
    pub density: f64,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        let cfg = SmoothingConfig::default();
        Self {
            enabled: false,
            screen_width: cfg.screen_width,
            screen_height: cfg.screen_height,
            density: cfg.density,
        }
    }
}

impl SmoothingSettings {
    pub fn to_smoothing_config(&self) -> Option<SmoothingConfig> {
        self.enabled.then(|| SmoothingConfig {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            density: self.density,
        })
    }
}

/// Everything the jiggler reads at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JigglerSettings {
    /// Feature state at startup; the control plane may flip it later.
    pub enabled: bool,
    pub origin: Point,
    pub anchor_target: Point,
    /// Extra path synthesized every cycle regardless of idle state.
    pub secondary_target: Option<Point>,
    pub interval: IntervalSettings,
    pub path: PathSettings,
    pub emit: EmitSettings,
    pub smoothing: SmoothingSettings,
}

impl Default for JigglerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            origin: Point::new(0, 0),
            anchor_target: Point::new(1, 1),
            secondary_target: None,
            interval: IntervalSettings::default(),
            path: PathSettings::default(),
            emit: EmitSettings::default(),
            smoothing: SmoothingSettings::default(),
        }
    }
}

/// Longest accepted base interval or jitter: one day.
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;

/// Target used for the optional per-cycle secondary path.
pub const DEFAULT_SECONDARY_TARGET: Point = Point::new(590, 650);

fn validate_range(name: &str, r: RangeSetting) -> Result<()> {
    ensure!(r.min < r.max, "{name}: min ({}) must be < max ({})", r.min, r.max);
    Ok(())
}

impl JigglerSettings {
    pub fn load(path: &FsPath) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings: Self = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let iv = &self.interval;
        ensure!(
            iv.base_secs.is_finite() && iv.base_secs >= 0.0,
            "interval.base_secs must be finite and >= 0"
        );
        ensure!(
            iv.jitter_secs.is_finite() && iv.jitter_secs >= 0.0,
            "interval.jitter_secs must be finite and >= 0"
        );
        ensure!(
            iv.base_secs <= MAX_INTERVAL_SECS && iv.jitter_secs <= MAX_INTERVAL_SECS,
            "interval.base_secs and interval.jitter_secs must be <= {MAX_INTERVAL_SECS}"
        );

        let p = &self.path;
        validate_range("path.node_floor", p.node_floor)?;
        validate_range("path.node_ceiling", p.node_ceiling)?;
        validate_range("path.variance", p.variance)?;
        ensure!(p.node_floor.min >= 2, "path.node_floor.min must be >= 2");
        ensure!(
            p.node_floor.max <= p.node_ceiling.min,
            "path.node_floor.max must be <= path.node_ceiling.min"
        );

        ensure!(
            self.emit.step_delay_ms_min <= self.emit.step_delay_ms_max,
            "emit.step_delay_ms_min must be <= emit.step_delay_ms_max"
        );

        let s = &self.smoothing;
        ensure!(
            s.density.is_finite() && s.density > 0.0,
            "smoothing.density must be finite and > 0"
        );
        ensure!(
            s.density <= MAX_DENSITY,
            "smoothing.density must be <= {MAX_DENSITY}"
        );
        ensure!(
            s.screen_width > 0 && s.screen_height > 0,
            "smoothing screen dimensions must be > 0"
        );

        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize config")
    }
}
