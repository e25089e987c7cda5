use arboard::Clipboard;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard error")]
    Arboard(#[from] arboard::Error),
    #[error("failed to create clipboard context")]
    Init,
}

pub fn copy_text(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard = Clipboard::new().map_err(|_| ClipboardError::Init)?;
    clipboard.set_text(text)?;
    Ok(())
}
