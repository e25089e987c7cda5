use super::{PickError, pick_with};
use crate::color::{Color, Rgb16};
use crate::display::{ClickEvent, Cursor, DisplayError, Point, Translation, Window, WindowSystem};
use crate::policy::{Disposition, ErrorPolicy};
use log::debug;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::x11_utils::X11Error;
use x11rb::{CURRENT_TIME, NONE};

/// `tcross` in the standard cursor font; the mask glyph follows it.
const XC_TCROSS: u16 = 130;

pub fn pick(display: Option<&str>) -> Result<Color, PickError> {
    let client = X11Client::connect(display)?;
    pick_with(&client)
}

impl From<ConnectionError> for DisplayError {
    fn from(e: ConnectionError) -> Self {
        DisplayError::Connection(e.to_string())
    }
}

/// A connection to an X server, bound to one screen.
///
/// Every protocol error the server reports, whether as a reply or as an
/// event while we wait for the click, goes through the client's
/// [`ErrorPolicy`].
pub struct X11Client {
    conn: RustConnection,
    root: Window,
    colormap: Colormap,
    policy: ErrorPolicy,
}

impl X11Client {
    pub fn connect(display: Option<&str>) -> Result<Self, PickError> {
        let (conn, screen_num) =
            x11rb::connect(display).map_err(|e| PickError::Connect(e.to_string()))?;
        Ok(Self::new(conn, screen_num, ErrorPolicy::new()))
    }

    pub fn new(conn: RustConnection, screen_num: usize, policy: ErrorPolicy) -> Self {
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let colormap = screen.default_colormap;
        debug!("screen {screen_num}: root {root:#x}, colormap {colormap:#x}");
        Self {
            conn,
            root,
            colormap,
            policy,
        }
    }

    fn classify(&self, error: &X11Error) -> DisplayError {
        let kind = error.error_kind;
        let request = error.major_opcode;
        match self.policy.classify(kind, request) {
            Disposition::Suppress => {
                debug!("ignoring {kind:?} error from request {request}");
                DisplayError::Suppressed { kind, request }
            }
            Disposition::Propagate => DisplayError::Protocol { kind, request },
        }
    }

    fn sift(&self, error: ReplyError) -> DisplayError {
        match error {
            ReplyError::ConnectionError(e) => e.into(),
            ReplyError::X11Error(e) => self.classify(&e),
        }
    }

    fn sift_id(&self, error: ReplyOrIdError) -> DisplayError {
        match error {
            ReplyOrIdError::IdsExhausted => {
                DisplayError::Connection("X resource ids exhausted".to_string())
            }
            ReplyOrIdError::ConnectionError(e) => e.into(),
            ReplyOrIdError::X11Error(e) => self.classify(&e),
        }
    }
}

fn window_or_none(window: Window) -> Option<Window> {
    (window != NONE).then_some(window)
}

impl WindowSystem for X11Client {
    fn root(&self) -> Window {
        self.root
    }

    fn create_crosshair_cursor(&self) -> Result<Cursor, DisplayError> {
        let font = self.conn.generate_id().map_err(|e| self.sift_id(e))?;
        self.conn
            .open_font(font, b"cursor")?
            .check()
            .map_err(|e| self.sift(e))?;

        let cursor = self.conn.generate_id().map_err(|e| self.sift_id(e))?;
        let created = self
            .conn
            .create_glyph_cursor(
                cursor,
                font,
                font,
                XC_TCROSS,
                XC_TCROSS + 1,
                0,
                0,
                0,
                u16::MAX,
                u16::MAX,
                u16::MAX,
            )?
            .check();
        self.conn.close_font(font)?;
        created.map_err(|e| self.sift(e))?;
        Ok(cursor)
    }

    fn free_cursor(&self, cursor: Cursor) -> Result<(), DisplayError> {
        self.conn.free_cursor(cursor)?;
        self.conn.flush()?;
        Ok(())
    }

    fn grab_pointer(&self, cursor: Cursor) -> Result<(), DisplayError> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                EventMask::BUTTON_PRESS,
                GrabMode::SYNC,
                GrabMode::ASYNC,
                self.root,
                cursor,
                CURRENT_TIME,
            )?
            .reply()
            .map_err(|e| self.sift(e))?;

        if reply.status != GrabStatus::SUCCESS {
            return Err(DisplayError::GrabRefused(format!("{:?}", reply.status)));
        }
        Ok(())
    }

    fn allow_queued_event(&self) -> Result<(), DisplayError> {
        self.conn.allow_events(Allow::SYNC_POINTER, CURRENT_TIME)?;
        self.conn.flush()?;
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<(), DisplayError> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        self.conn.flush()?;
        Ok(())
    }

    fn wait_for_button_press(&self) -> Result<ClickEvent, DisplayError> {
        loop {
            match self.conn.wait_for_event()? {
                Event::ButtonPress(e) if e.event == self.root => {
                    return Ok(ClickEvent {
                        window: e.event,
                        subwindow: window_or_none(e.child),
                        position: Point::new(e.event_x, e.event_y),
                    });
                }
                Event::Error(e) => {
                    let err = self.classify(&e);
                    if !err.is_suppressed() {
                        return Err(err);
                    }
                }
                event => debug!("ignoring {event:?} while waiting for a click"),
            }
        }
    }

    fn translate_coordinates(
        &self,
        from: Window,
        to: Window,
        point: Point,
    ) -> Result<Option<Translation>, DisplayError> {
        let reply = self
            .conn
            .translate_coordinates(from, to, point.x, point.y)?
            .reply()
            .map_err(|e| self.sift(e))?;

        if !reply.same_screen {
            return Ok(None);
        }
        Ok(Some(Translation {
            position: Point::new(reply.dst_x, reply.dst_y),
            child: window_or_none(reply.child),
        }))
    }

    fn capture_single_pixel(&self, window: Window, point: Point) -> Result<u32, DisplayError> {
        let image = self
            .conn
            .get_image(ImageFormat::Z_PIXMAP, window, point.x, point.y, 1, 1, !0)?
            .reply()
            .map_err(|e| self.sift(e))?;

        let setup = self.conn.setup();
        let bits_per_pixel = setup
            .pixmap_formats
            .iter()
            .find(|f| f.depth == image.depth)
            .map(|f| f.bits_per_pixel)
            .unwrap_or(image.depth);

        pixel_from_bytes(
            &image.data,
            bits_per_pixel,
            setup.image_byte_order,
            setup.bitmap_format_bit_order,
        )
        .ok_or(DisplayError::EmptyReply("GetImage"))
    }

    fn resolve_color(&self, pixel: u32) -> Result<Rgb16, DisplayError> {
        let reply = self
            .conn
            .query_colors(self.colormap, &[pixel])?
            .reply()
            .map_err(|e| self.sift(e))?;

        let rgb = reply
            .colors
            .first()
            .ok_or(DisplayError::EmptyReply("QueryColors"))?;
        Ok(Rgb16::new(rgb.red, rgb.green, rgb.blue))
    }
}

/// Extract the first pixel of a ZPixmap scanline.
fn pixel_from_bytes(
    data: &[u8],
    bits_per_pixel: u8,
    byte_order: ImageOrder,
    bit_order: ImageOrder,
) -> Option<u32> {
    match bits_per_pixel {
        1 => {
            let byte = *data.first()?;
            let bit = if bit_order == ImageOrder::MSB_FIRST {
                byte >> 7
            } else {
                byte & 1
            };
            Some(u32::from(bit))
        }
        4 => {
            let byte = *data.first()?;
            let nibble = if byte_order == ImageOrder::MSB_FIRST {
                byte >> 4
            } else {
                byte & 0x0f
            };
            Some(u32::from(nibble))
        }
        8 | 16 | 24 | 32 => {
            let bytes = data.get(..usize::from(bits_per_pixel / 8))?;
            let fold = |acc: u32, b: &u8| (acc << 8) | u32::from(*b);
            Some(if byte_order == ImageOrder::MSB_FIRST {
                bytes.iter().fold(0, fold)
            } else {
                bytes.iter().rev().fold(0, fold)
            })
        }
        _ => None,
    }
}
