use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::JigglerSettings;
use crate::model::{Path, Point};
use crate::path::{synthesize_path, PathConfig};
use crate::sampling::symmetric_jitter;
use crate::smoothing::{smooth_path, SmoothingConfig};
use crate::state::{JigglerState, ReadyGate, StateSnapshot};
use crate::transport::{emit_path, sleep_interruptible, CursorTransport};

/// Scheduler-owned configuration. Only the scheduler mutates it after construction.
#[derive(Debug, Clone)]
pub struct JigglerConfig {
    pub origin: Point,
    pub anchor_target: Point,
    pub secondary_target: Option<Point>,
    pub base_interval_secs: f64,
    pub jitter_secs: f64,
    /// Most recently computed wait; always >= 0.
    pub current_interval: f64,
    pub path: PathConfig,
    pub smoothing: Option<SmoothingConfig>,
    pub step_delay_ms: RangeInclusive<u64>,
}

impl Default for JigglerConfig {
    fn default() -> Self {
        Self::from_settings(&JigglerSettings::default())
    }
}

impl JigglerConfig {
    pub fn from_settings(settings: &JigglerSettings) -> Self {
        Self {
            origin: settings.origin,
            anchor_target: settings.anchor_target,
            secondary_target: settings.secondary_target,
            base_interval_secs: settings.interval.base_secs,
            jitter_secs: settings.interval.jitter_secs,
            current_interval: 0.0,
            path: settings.path.to_path_config(),
            smoothing: settings.smoothing.to_smoothing_config(),
            step_delay_ms: settings.emit.step_delay_ms(),
        }
    }

    /// Draw a fresh interval: `max(0, base + U[-jitter, +jitter])`.
    pub fn calc_new_interval(&mut self, rng: &mut impl Rng) -> f64 {
        let jitter = symmetric_jitter(self.jitter_secs, rng);
        self.current_interval = (self.base_interval_secs + jitter).max(0.0);
        debug!(
            jitter,
            interval = self.current_interval,
            "jiggler new interval"
        );
        self.current_interval
    }
}

/// Whether a jiggle is due.
///
/// The interval is truncated to whole seconds before comparing, so any
/// sub-second interval counts as already elapsed.
pub fn is_idle(snapshot: &StateSnapshot, now: Instant, interval_secs: f64) -> bool {
    if !snapshot.enabled {
        return false;
    }
    let threshold = Duration::from_secs(interval_secs.max(0.0) as u64);
    now.saturating_duration_since(snapshot.last_real_input) > threshold
}

fn interval_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

pub struct Scheduler<R> {
    config: JigglerConfig,
    state: Arc<JigglerState>,
    transport: Box<dyn CursorTransport + Send>,
    rng: R,
    stop: Arc<AtomicBool>,
    iterations: u64,
    jiggles: u64,
}

impl<R: Rng> Scheduler<R> {
    /// Build a scheduler and draw its first interval.
    pub fn new(
        mut config: JigglerConfig,
        state: Arc<JigglerState>,
        transport: Box<dyn CursorTransport + Send>,
        mut rng: R,
    ) -> Self {
        config.calc_new_interval(&mut rng);
        Self {
            config,
            state,
            transport,
            rng,
            stop: Arc::new(AtomicBool::new(false)),
            iterations: 0,
            jiggles: 0,
        }
    }

    pub fn config(&self) -> &JigglerConfig {
        &self.config
    }

    pub fn current_interval(&self) -> f64 {
        self.config.current_interval
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn jiggles(&self) -> u64 {
        self.jiggles
    }

    /// Flag that stops the loop at its next check.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn prepare(&self, path: Path) -> Path {
        match &self.config.smoothing {
            Some(cfg) => smooth_path(&path, cfg),
            None => path,
        }
    }

    fn emit_toward(&mut self, start: Point, target: Point) -> Result<usize> {
        let path = synthesize_path(start, target, &self.config.path, &mut self.rng);
        debug!(?start, ?target, xs = ?path.xs, ys = ?path.ys, "jiggle path");
        let path = self.prepare(path);
        emit_path(
            self.transport.as_mut(),
            &path,
            &self.config.step_delay_ms,
            &self.stop,
            &mut self.rng,
        )
    }

    fn jiggle(&mut self) {
        let origin = self.config.origin;
        let anchor = self.config.anchor_target;

        if let Err(err) = self.emit_toward(origin, anchor) {
            warn!("failed to jiggle mouse: {err:#}");
        }
        if let Err(err) = self.emit_toward(anchor, origin) {
            warn!("failed to reset mouse position: {err:#}");
        }
        self.jiggles += 1;
    }

    /// One pass of the loop body without the sleep.
    ///
    /// Returns the number of jiggles emitted (0 or 1).
    pub fn run_iteration(&mut self, now: Instant) -> usize {
        self.iterations += 1;
        let snapshot = self.state.snapshot();

        let mut emitted = 0;
        if is_idle(&snapshot, now, self.config.current_interval) {
            info!(
                idle_secs = now
                    .saturating_duration_since(snapshot.last_real_input)
                    .as_secs(),
                "idle threshold exceeded, jiggling"
            );
            self.jiggle();
            emitted = 1;
        }

        if let Some(target) = self.config.secondary_target {
            let path = synthesize_path(self.config.origin, target, &self.config.path, &mut self.rng);
            debug!(?target, xs = ?path.xs, ys = ?path.ys, "secondary path");
        }

        emitted
    }

    /// Run until the stop flag is raised.
    pub fn run(&mut self) {
        info!(
            base = self.config.base_interval_secs,
            jitter = self.config.jitter_secs,
            "jiggler scheduler started"
        );

        while !self.stop.load(Ordering::SeqCst) {
            self.run_iteration(Instant::now());
            sleep_interruptible(&self.stop, interval_to_ms(self.config.current_interval));
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            self.config.calc_new_interval(&mut self.rng);
        }

        info!(
            iterations = self.iterations,
            jiggles = self.jiggles,
            "jiggler scheduler stopped"
        );
    }
}

impl<R: Rng + Send + 'static> Scheduler<R> {
    /// Run the loop on a background thread once `gate` opens.
    ///
    /// The thread hands the scheduler back when it stops so callers can
    /// inspect its counters.
    pub fn spawn(mut self, gate: Arc<ReadyGate>) -> Result<JoinHandle<Self>> {
        std::thread::Builder::new()
            .name("jiggler".to_string())
            .spawn(move || {
                if gate.wait_ready(&self.stop) {
                    self.run();
                } else {
                    debug!("jiggler stopped before configuration was ready");
                }
                self
            })
            .context("failed to spawn jiggler thread")
    }
}
