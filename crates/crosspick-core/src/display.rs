//! The capabilities the pick pipeline needs from a windowing system.
//!
//! The X11 backend implements [`WindowSystem`] over a live server connection;
//! tests implement it over an in-memory window tree.

use crate::color::Rgb16;
use thiserror::Error;
use x11rb::protocol::ErrorKind;

pub use x11rb::protocol::xproto::{Cursor, Window};

/// A position local to some window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// A button press delivered while the pointer was grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    /// Window the event was delivered to.
    pub window: Window,
    /// Child of `window` that contains the pointer, if any.
    pub subwindow: Option<Window>,
    /// Pointer position relative to `window`.
    pub position: Point,
}

/// Result of mapping a point from one window into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// The point in the destination window's space.
    pub position: Point,
    /// Child of the destination window containing the point.
    pub child: Option<Window>,
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("ignored {kind:?} error from request {request}")]
    Suppressed { kind: ErrorKind, request: u8 },
    #[error("{kind:?} error from request {request}")]
    Protocol { kind: ErrorKind, request: u8 },
    #[error("pointer grab refused: {0}")]
    GrabRefused(String),
    #[error("server returned an empty {0} reply")]
    EmptyReply(&'static str),
}

impl DisplayError {
    /// Whether the error policy forgave this error.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, DisplayError::Suppressed { .. })
    }
}

/// Windowing-system operations used by the pick pipeline.
///
/// Every method borrows `self` immutably so that release guards can hold a
/// reference while the pipeline keeps issuing requests.
pub trait WindowSystem {
    /// Root window of the screen being picked from.
    fn root(&self) -> Window;

    fn create_crosshair_cursor(&self) -> Result<Cursor, DisplayError>;

    fn free_cursor(&self, cursor: Cursor) -> Result<(), DisplayError>;

    /// Exclusive, synchronous grab of button presses over the root window.
    fn grab_pointer(&self, cursor: Cursor) -> Result<(), DisplayError>;

    /// Let the server deliver the event it holds back under a synchronous grab.
    fn allow_queued_event(&self) -> Result<(), DisplayError>;

    fn ungrab_pointer(&self) -> Result<(), DisplayError>;

    /// Block until a button press arrives on the root window. There is no timeout.
    fn wait_for_button_press(&self) -> Result<ClickEvent, DisplayError>;

    /// Map `point` from `from`'s space into `to`'s space.
    ///
    /// `Ok(None)` means the windows live on different screens.
    fn translate_coordinates(
        &self,
        from: Window,
        to: Window,
        point: Point,
    ) -> Result<Option<Translation>, DisplayError>;

    /// Raw value of the single pixel at `point` in `window`.
    fn capture_single_pixel(&self, window: Window, point: Point) -> Result<u32, DisplayError>;

    /// Resolve a raw pixel through the screen's colormap.
    fn resolve_color(&self, pixel: u32) -> Result<Rgb16, DisplayError>;
}
