pub mod wayland;
pub mod x11;

use crate::color::Color;
use crate::display::{ClickEvent, Cursor, DisplayError, Point, Window, WindowSystem};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PickError {
    #[error("failed to open display: {0}")]
    Connect(String),
    #[error("desktop portal unavailable: {0}")]
    PortalUnavailable(String),
    #[error("Wayland pick failed: {0}")]
    Wayland(String),
    #[error("no display server detected")]
    NoDisplay,
    #[error("failed to grab mouse")]
    Grab(#[source] DisplayError),
    #[error("failed to grab color")]
    ColorGrab(#[source] DisplayError),
    #[error("color pick cancelled")]
    Cancelled,
}

impl PickError {
    /// Errors that mean the environment cannot support picking at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PickError::Connect(_)
                | PickError::PortalUnavailable(_)
                | PickError::NoDisplay
                | PickError::Grab(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayServer {
    X11,
    Wayland,
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::X11 => write!(f, "x11"),
            DisplayServer::Wayland => write!(f, "wayland"),
        }
    }
}

pub fn detect_display_server() -> Result<DisplayServer, PickError> {
    // Check WAYLAND_DISPLAY first (more specific)
    if std::env::var("WAYLAND_DISPLAY").is_ok() {
        return Ok(DisplayServer::Wayland);
    }
    if let Ok(session_type) = std::env::var("XDG_SESSION_TYPE") {
        match session_type.as_str() {
            "wayland" => return Ok(DisplayServer::Wayland),
            "x11" => return Ok(DisplayServer::X11),
            _ => {}
        }
    }
    if std::env::var("DISPLAY").is_ok() {
        return Ok(DisplayServer::X11);
    }
    Err(PickError::NoDisplay)
}

/// Wait for a click and return the colour of the pixel under it.
///
/// `x11_display` names the X display to use instead of `$DISPLAY`.
pub fn pick(server: DisplayServer, x11_display: Option<&str>) -> Result<Color, PickError> {
    match server {
        DisplayServer::X11 => x11::pick(x11_display),
        DisplayServer::Wayland => wayland::pick(),
    }
}

/// The window that was actually clicked and the click position local to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub window: Window,
    pub position: Point,
}

/// Frees the crosshair cursor when dropped.
struct CursorGuard<'a, W: WindowSystem + ?Sized> {
    ws: &'a W,
    cursor: Cursor,
}

impl<W: WindowSystem + ?Sized> Drop for CursorGuard<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.ws.free_cursor(self.cursor) {
            warn!("failed to free cursor {:#x}: {e}", self.cursor);
        }
    }
}

/// An active pointer grab, released when dropped.
struct PointerGrab<'a, W: WindowSystem + ?Sized> {
    ws: &'a W,
}

impl<'a, W: WindowSystem + ?Sized> PointerGrab<'a, W> {
    fn acquire(ws: &'a W, cursor: Cursor) -> Result<Self, DisplayError> {
        ws.grab_pointer(cursor)?;
        debug!("pointer grabbed on root {:#x}", ws.root());
        Ok(Self { ws })
    }
}

impl<W: WindowSystem + ?Sized> Drop for PointerGrab<'_, W> {
    fn drop(&mut self) {
        match self.ws.ungrab_pointer() {
            Ok(()) => debug!("pointer released"),
            Err(e) => warn!("failed to release pointer grab: {e}"),
        }
    }
}

/// Grab the pointer with a crosshair cursor and wait for one button press.
///
/// The grab is released and the cursor freed before this returns, whether or
/// not a click was received.
pub fn grab_click<W: WindowSystem + ?Sized>(ws: &W) -> Result<ClickEvent, PickError> {
    let cursor = ws.create_crosshair_cursor().map_err(PickError::ColorGrab)?;
    let _cursor = CursorGuard { ws, cursor };

    let _grab = PointerGrab::acquire(ws, cursor).map_err(PickError::Grab)?;
    ws.allow_queued_event().map_err(PickError::ColorGrab)?;
    let click = ws.wait_for_button_press().map_err(PickError::ColorGrab)?;
    debug!(
        "button press on {:#x} (subwindow {:?}) at {},{}",
        click.window, click.subwindow, click.position.x, click.position.y
    );
    Ok(click)
}

/// Descend from `top` through `candidate` to the deepest window under `point`.
///
/// `point` is relative to `top`. Returns `None` when there is no candidate to
/// start from. The descent stops when the server reports no child under the
/// point, when the windows are on different screens, or when a translation
/// fails with an error the policy forgives. Other errors abort the descent.
///
/// The result always pairs a window with a position in that window's space: if
/// a translation fails, the last window successfully translated into is used.
pub fn resolve_subject<W: WindowSystem + ?Sized>(
    ws: &W,
    top: Window,
    candidate: Option<Window>,
    point: Point,
) -> Result<Option<Subject>, DisplayError> {
    let Some(mut candidate) = candidate else {
        return Ok(None);
    };
    let mut top = top;
    let mut subject = Subject {
        window: top,
        position: point,
    };

    loop {
        let translation = match ws.translate_coordinates(top, candidate, subject.position) {
            Ok(Some(t)) => t,
            Ok(None) => {
                debug!("{top:#x} and {candidate:#x} are on different screens");
                break;
            }
            Err(e) if e.is_suppressed() => {
                debug!("descent stopped at {candidate:#x}: {e}");
                break;
            }
            Err(e) => return Err(e),
        };
        subject = Subject {
            window: candidate,
            position: translation.position,
        };
        let Some(child) = translation.child else {
            break;
        };
        top = candidate;
        candidate = child;
    }

    Ok(Some(subject))
}

/// Grab a click and work out which window it landed on.
///
/// A click on bare background resolves to the root window.
pub fn select_window<W: WindowSystem + ?Sized>(ws: &W) -> Result<Subject, PickError> {
    let click = grab_click(ws)?;
    let subject = resolve_subject(ws, click.window, click.subwindow, click.position)
        .map_err(PickError::ColorGrab)?;

    Ok(subject.unwrap_or_else(|| {
        warn!("no target window under pointer, using root window");
        Subject {
            window: ws.root(),
            position: click.position,
        }
    }))
}

/// Read the pixel at the subject's position and resolve it to 8-bit RGB.
pub fn read_color<W: WindowSystem + ?Sized>(ws: &W, subject: Subject) -> Result<Color, PickError> {
    let pixel = ws
        .capture_single_pixel(subject.window, subject.position)
        .map_err(PickError::ColorGrab)?;
    let rgb = ws.resolve_color(pixel).map_err(PickError::ColorGrab)?;
    debug!("pixel {pixel:#x} in {:#x} resolves to {rgb:?}", subject.window);
    Ok(Color::from(rgb))
}

/// Run the whole pipeline against an open windowing system.
pub fn pick_with<W: WindowSystem + ?Sized>(ws: &W) -> Result<Color, PickError> {
    let subject = select_window(ws)?;
    read_color(ws, subject)
}
