pub mod backends;
pub(crate) mod util;

use std::ops::RangeInclusive;
use std::sync::atomic::AtomicBool;

use anyhow::{anyhow, Result};
use rand::Rng;
use tracing::trace;

use crate::model::Path;

pub use util::sleep_interruptible;

/// Delivers absolute cursor reports to the target machine.
pub trait CursorTransport {
    fn report_absolute(&mut self, x: i32, y: i32, buttons: u8) -> Result<()>;
}

impl<T: CursorTransport + ?Sized> CursorTransport for Box<T> {
    fn report_absolute(&mut self, x: i32, y: i32, buttons: u8) -> Result<()> {
        (**self).report_absolute(x, y, buttons)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportBackend {
    Auto,
    X11,
    /// Dry run: reports are only logged.
    Log,
}

/// A backend after environment detection; never `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBackend {
    X11,
    Log,
}

fn env_is_set(name: &str) -> bool {
    std::env::var_os(name)
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

fn auto_backend() -> Option<ResolvedBackend> {
    if env_is_set("DISPLAY") {
        return Some(ResolvedBackend::X11);
    }

    // Unknown/unsupported environment.
    None
}

fn backend_unavailable_message() -> String {
    let xdg_session_type = std::env::var("XDG_SESSION_TYPE").unwrap_or_default();

    let mut parts = Vec::new();

    if env_is_set("DISPLAY") {
        parts.push("DISPLAY is set".to_string());
    }
    if env_is_set("WAYLAND_DISPLAY") {
        parts.push("WAYLAND_DISPLAY is set".to_string());
    }
    if !xdg_session_type.is_empty() {
        parts.push(format!("XDG_SESSION_TYPE={xdg_session_type}"));
    }

    if parts.is_empty() {
        "No display session detected (expected X11 environment variables).".to_string()
    } else {
        format!("Detected environment: {}", parts.join(", "))
    }
}

fn require_supported_backend(
    #[allow(unused_variables)] selected: TransportBackend,
    resolved: Option<ResolvedBackend>,
) -> Result<ResolvedBackend> {
    match resolved {
        Some(ResolvedBackend::Log) => Ok(ResolvedBackend::Log),
        Some(ResolvedBackend::X11) => {
            #[cfg(feature = "x11")]
            {
                Ok(ResolvedBackend::X11)
            }

            #[cfg(not(feature = "x11"))]
            {
                let how = match selected {
                    TransportBackend::Auto => "detected",
                    _ => "requested",
                };
                Err(anyhow!(
                    "X11 backend {how} but is disabled in this build. (Rebuild with `--features x11`.) {details}",
                    how = how,
                    details = backend_unavailable_message()
                ))
            }
        }
        None => Err(anyhow!(
            "No supported transport backend detected. {details}\n\
             Pass `--backend log` for a dry run.",
            details = backend_unavailable_message(),
        )),
    }
}

pub fn resolve_backend(requested: TransportBackend) -> Result<ResolvedBackend> {
    let resolved = match requested {
        TransportBackend::Auto => auto_backend(),
        TransportBackend::X11 => Some(ResolvedBackend::X11),
        TransportBackend::Log => Some(ResolvedBackend::Log),
    };

    require_supported_backend(requested, resolved)
}

/// Resolve `requested` and open a connection to the chosen backend.
pub fn open_transport(requested: TransportBackend) -> Result<Box<dyn CursorTransport + Send>> {
    match resolve_backend(requested)? {
        ResolvedBackend::Log => Ok(Box::new(backends::log::LogTransport::default())),
        ResolvedBackend::X11 => {
            #[cfg(feature = "x11")]
            {
                Ok(Box::new(backends::x11::X11Transport::connect()?))
            }

            #[cfg(not(feature = "x11"))]
            {
                Err(anyhow!(
                    "X11 backend is disabled in this build (rebuild with `--features x11`)."
                ))
            }
        }
    }
}

/// Emit every node of `path` as an absolute report with no buttons held.
///
/// Between nodes the emitter waits a random delay from `step_delay_ms`. The
/// first transport error stops the emission and is returned.
pub fn emit_path<T: CursorTransport + ?Sized>(
    transport: &mut T,
    path: &Path,
    step_delay_ms: &RangeInclusive<u64>,
    stop: &AtomicBool,
    rng: &mut impl Rng,
) -> Result<usize> {
    let mut sent = 0usize;
    for (i, (x, y)) in path.nodes().enumerate() {
        if i > 0 && *step_delay_ms.end() > 0 {
            let ms = if step_delay_ms.is_empty() {
                *step_delay_ms.start()
            } else {
                rng.gen_range(step_delay_ms.clone())
            };
            sleep_interruptible(stop, ms);
        }
        let (x, y) = (x.round() as i32, y.round() as i32);
        trace!(x, y, "absolute report");
        transport.report_absolute(x, y, 0)?;
        sent += 1;
    }
    Ok(sent)
}
