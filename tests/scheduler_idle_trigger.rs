use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use jiggler::model::Point;
use jiggler::scheduler::{is_idle, JigglerConfig, Scheduler};
use jiggler::smoothing::SmoothingConfig;
use jiggler::state::{JigglerState, ReadyGate, StateSnapshot};
use jiggler::transport::CursorTransport;

type Reports = Arc<Mutex<Vec<(i32, i32, u8)>>>;

#[derive(Default)]
struct RecordingTransport {
    reports: Reports,
}

impl CursorTransport for RecordingTransport {
    fn report_absolute(&mut self, x: i32, y: i32, buttons: u8) -> Result<()> {
        self.reports.lock().unwrap().push((x, y, buttons));
        Ok(())
    }
}

struct FailingTransport {
    calls: Arc<Mutex<usize>>,
}

impl CursorTransport for FailingTransport {
    fn report_absolute(&mut self, _x: i32, _y: i32, _buttons: u8) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        Err(anyhow!("link down"))
    }
}

fn fixed_config(base: f64) -> JigglerConfig {
    JigglerConfig {
        origin: Point::new(0, 0),
        anchor_target: Point::new(40, 30),
        base_interval_secs: base,
        jitter_secs: 0.0,
        step_delay_ms: 0..=0,
        ..Default::default()
    }
}

fn recording_scheduler(
    cfg: JigglerConfig,
    state: Arc<JigglerState>,
) -> (Scheduler<StdRng>, Reports) {
    let transport = RecordingTransport::default();
    let reports = transport.reports.clone();
    let scheduler = Scheduler::new(cfg, state, Box::new(transport), StdRng::seed_from_u64(3));
    (scheduler, reports)
}

#[test]
fn idle_predicate_truncates_to_whole_seconds() {
    let t0 = Instant::now();
    let snap = StateSnapshot {
        enabled: true,
        last_real_input: t0,
    };

    assert!(!is_idle(&snap, t0 + Duration::from_secs(5), 5.0));
    assert!(is_idle(&snap, t0 + Duration::from_millis(5_001), 5.0));

    // 5.9 truncates to 5.
    assert!(is_idle(&snap, t0 + Duration::from_millis(5_500), 5.9));
    assert!(!is_idle(&snap, t0 + Duration::from_millis(4_999), 5.9));

    // Sub-second intervals are always elapsed once any time has passed.
    assert!(is_idle(&snap, t0 + Duration::from_millis(1), 0.7));

    let disabled = StateSnapshot {
        enabled: false,
        ..snap
    };
    assert!(!is_idle(&disabled, t0 + Duration::from_secs(3_600), 5.0));
}

#[test]
fn emits_one_jiggle_pair_only_after_interval() {
    let t0 = Instant::now();
    let state = Arc::new(JigglerState::new(true, t0));
    let (mut scheduler, reports) = recording_scheduler(fixed_config(5.0), state);
    assert_eq!(scheduler.current_interval(), 5.0);

    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(2)), 0);
    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(5)), 0);
    assert!(reports.lock().unwrap().is_empty());

    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(6)), 1);
    assert_eq!(scheduler.jiggles(), 1);

    let reports = reports.lock().unwrap();
    assert!(reports.len() >= 4, "expected two paths of >= 2 nodes");
    assert_eq!(reports.first(), Some(&(0, 0, 0)));
    assert_eq!(reports.last(), Some(&(0, 0, 0)));
    assert!(reports.contains(&(40, 30, 0)), "expected the anchor target");
    assert!(reports.iter().all(|(_, _, buttons)| *buttons == 0));
}

#[test]
fn smoothing_resamples_both_halves_of_the_jiggle() {
    let t0 = Instant::now();
    let state = Arc::new(JigglerState::new(true, t0));
    let cfg = JigglerConfig {
        smoothing: Some(SmoothingConfig::default()),
        ..fixed_config(5.0)
    };
    let (mut scheduler, reports) = recording_scheduler(cfg, state);

    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(6)), 1);

    let n = SmoothingConfig::default().sample_count();
    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 2 * n);
    assert_eq!(reports[0], (0, 0, 0));
    assert_eq!(reports[n - 1], (40, 30, 0));
    assert_eq!(reports[n], (40, 30, 0));
    assert_eq!(reports.last(), Some(&(0, 0, 0)));
}

#[test]
fn fresh_input_resets_the_idle_clock() {
    let t0 = Instant::now();
    let state = Arc::new(JigglerState::new(true, t0));
    let (mut scheduler, _reports) = recording_scheduler(fixed_config(5.0), state.clone());

    state.report_real_input(t0 + Duration::from_secs(4));
    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(8)), 0);
    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(10)), 1);
}

#[test]
fn disabling_suppresses_jiggles_until_reenabled() {
    let t0 = Instant::now();
    let state = Arc::new(JigglerState::new(true, t0));
    let (mut scheduler, _reports) = recording_scheduler(fixed_config(1.0), state.clone());

    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(10)), 1);

    state.set_enabled(false);
    assert!(!state.enabled());
    for secs in [20, 60, 600] {
        assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(secs)), 0);
    }

    state.set_enabled(true);
    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(601)), 1);
    assert_eq!(scheduler.jiggles(), 2);
    assert_eq!(scheduler.iterations(), 5);
}

#[test]
fn transport_failures_do_not_abort_the_cycle() {
    let t0 = Instant::now();
    let state = Arc::new(JigglerState::new(true, t0));
    let calls = Arc::new(Mutex::new(0usize));
    let transport = FailingTransport {
        calls: calls.clone(),
    };
    let mut scheduler = Scheduler::new(
        fixed_config(1.0),
        state,
        Box::new(transport),
        StdRng::seed_from_u64(9),
    );

    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(5)), 1);
    // Both the jiggle and the reset were attempted.
    assert_eq!(*calls.lock().unwrap(), 2);

    assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(9)), 1);
    assert_eq!(*calls.lock().unwrap(), 4);
}

#[test]
fn secondary_target_never_emits() {
    let t0 = Instant::now();
    let state = Arc::new(JigglerState::new(false, t0));
    let cfg = JigglerConfig {
        secondary_target: Some(Point::new(590, 650)),
        ..fixed_config(5.0)
    };
    let (mut scheduler, reports) = recording_scheduler(cfg, state);

    for secs in 1..5 {
        assert_eq!(scheduler.run_iteration(t0 + Duration::from_secs(secs * 100)), 0);
    }
    assert!(reports.lock().unwrap().is_empty());
}

#[test]
fn zero_interval_runs_a_tight_loop_until_stopped() {
    let state = Arc::new(JigglerState::new(false, Instant::now()));
    let (scheduler, _reports) = recording_scheduler(fixed_config(0.0), state);
    assert_eq!(scheduler.current_interval(), 0.0);

    let stop = scheduler.stop_handle();
    let gate = Arc::new(ReadyGate::new());
    gate.open();

    let handle = scheduler.spawn(gate).expect("spawn scheduler");
    std::thread::sleep(Duration::from_millis(50));
    stop.store(true, Ordering::SeqCst);

    let scheduler = handle.join().expect("scheduler thread");
    assert!(
        scheduler.iterations() > 1,
        "expected many iterations, got {}",
        scheduler.iterations()
    );
    assert_eq!(scheduler.jiggles(), 0);
}

#[test]
fn scheduler_waits_for_configuration() {
    let state = Arc::new(JigglerState::new(true, Instant::now()));
    let (scheduler, reports) = recording_scheduler(fixed_config(0.0), state);

    let stop = scheduler.stop_handle();
    let gate = Arc::new(ReadyGate::new());
    assert!(!gate.is_ready());

    let handle = scheduler.spawn(gate.clone()).expect("spawn scheduler");
    std::thread::sleep(Duration::from_millis(100));
    stop.store(true, Ordering::SeqCst);

    let scheduler = handle.join().expect("scheduler thread");
    assert_eq!(scheduler.iterations(), 0);
    assert!(reports.lock().unwrap().is_empty());
}

#[test]
fn stop_interrupts_a_long_sleep() {
    let state = Arc::new(JigglerState::new(false, Instant::now()));
    let (scheduler, _reports) = recording_scheduler(fixed_config(3_600.0), state);

    let stop = scheduler.stop_handle();
    let gate = Arc::new(ReadyGate::new());
    gate.open();

    let started = Instant::now();
    let handle = scheduler.spawn(gate).expect("spawn scheduler");
    std::thread::sleep(Duration::from_millis(50));
    stop.store(true, Ordering::SeqCst);

    let scheduler = handle.join().expect("scheduler thread");
    assert_eq!(scheduler.iterations(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}
