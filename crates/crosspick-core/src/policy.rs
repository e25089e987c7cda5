use x11rb::protocol::ErrorKind;
use x11rb::protocol::xproto::{
    FREE_COLORS_REQUEST, GET_GEOMETRY_REQUEST, GET_WINDOW_ATTRIBUTES_REQUEST,
    QUERY_COLORS_REQUEST, QUERY_TREE_REQUEST,
};

/// What to do with a protocol error reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Known benign race; the failing request simply did not produce a result.
    Suppress,
    /// A real fault; surface it to the caller.
    Propagate,
}

/// Decides which X protocol errors are forgiven.
///
/// Windows come and go while we look at them, so a handful of errors from
/// lookup requests are expected and harmless. Everything else is a fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorPolicy;

impl ErrorPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Classify an error by its kind and the major opcode of the request that caused it.
    pub fn classify(&self, kind: ErrorKind, request: u8) -> Disposition {
        let benign = match kind {
            ErrorKind::Alloc => true,
            ErrorKind::Access => request == FREE_COLORS_REQUEST,
            ErrorKind::Drawable => request == GET_GEOMETRY_REQUEST,
            ErrorKind::Window => {
                request == GET_WINDOW_ATTRIBUTES_REQUEST || request == QUERY_TREE_REQUEST
            }
            ErrorKind::Value => request == QUERY_COLORS_REQUEST,
            _ => false,
        };
        if benign {
            Disposition::Suppress
        } else {
            Disposition::Propagate
        }
    }
}
