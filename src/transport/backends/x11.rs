use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xtest::ConnectionExt as _;
use x11rb::protocol::{xproto, xtest};
use x11rb::rust_connection::RustConnection;

use crate::transport::CursorTransport;

/// Button mask bit `i` maps to X11 pointer button `i + 1`.
const BUTTON_COUNT: u8 = 3;

fn query_xtest(conn: &impl Connection) -> Result<()> {
    let ext = conn
        .extension_information(xtest::X11_EXTENSION_NAME)
        .context("failed to query X11 extension info")?;

    if ext.is_none() {
        return Err(anyhow!(
            "X11 backend requires the XTEST extension (not present on this X server)"
        ));
    }

    let version = conn
        .xtest_get_version(2, 2)
        .context("failed to request XTEST version")?
        .reply()
        .context("XTEST version query failed")?;
    debug!(
        major = version.major_version,
        minor = version.minor_version,
        "XTEST available"
    );

    Ok(())
}

fn clamp_to_screen(v: i32, extent: u16) -> i16 {
    let max = i32::from(extent).saturating_sub(1).min(i32::from(i16::MAX));
    // max >= 0 so the result always fits in i16.
    v.clamp(0, max.max(0)) as i16
}

/// Pointer transport backed by XTEST fake input on the default screen.
pub struct X11Transport {
    conn: RustConnection,
    root: xproto::Window,
    width: u16,
    height: u16,
    held: u8,
}

impl X11Transport {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("failed to connect to X11")?;
        query_xtest(&conn)?;

        let (root, width, height) = {
            let screen = conn
                .setup()
                .roots
                .get(screen_num)
                .ok_or_else(|| anyhow!("invalid X11 screen index"))?;
            (
                screen.root,
                screen.width_in_pixels,
                screen.height_in_pixels,
            )
        };

        info!(width, height, "connected to X11 screen");

        Ok(Self {
            conn,
            root,
            width,
            height,
            held: 0,
        })
    }

    fn fake(&self, type_: u8, detail: u8, x: i16, y: i16) -> Result<()> {
        self.conn
            .xtest_fake_input(type_, detail, x11rb::CURRENT_TIME, self.root, x, y, 0)
            .context("failed to send XTEST fake input")?;
        Ok(())
    }

    fn sync_buttons(&mut self, buttons: u8) -> Result<()> {
        for bit in 0..BUTTON_COUNT {
            let mask = 1u8 << bit;
            let want = buttons & mask != 0;
            let have = self.held & mask != 0;
            if want == have {
                continue;
            }
            let type_ = if want {
                xproto::BUTTON_PRESS_EVENT
            } else {
                xproto::BUTTON_RELEASE_EVENT
            };
            debug!(button = bit + 1, pressed = want, "xtest button");
            self.fake(type_, bit + 1, 0, 0)?;
        }
        self.held = buttons;
        Ok(())
    }
}

impl CursorTransport for X11Transport {
    fn report_absolute(&mut self, x: i32, y: i32, buttons: u8) -> Result<()> {
        let x = clamp_to_screen(x, self.width);
        let y = clamp_to_screen(y, self.height);

        // detail = 0 makes the motion absolute.
        self.fake(xproto::MOTION_NOTIFY_EVENT, 0, x, y)?;
        self.sync_buttons(buttons)?;
        self.conn
            .flush()
            .context("failed to flush X11 connection")?;
        Ok(())
    }
}

impl Drop for X11Transport {
    fn drop(&mut self) {
        // Best-effort release so no button stays held after an abort.
        let _ = self.sync_buttons(0);
        let _ = self.conn.flush();
    }
}
