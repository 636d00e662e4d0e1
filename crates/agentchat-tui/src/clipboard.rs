use agentchat_core::{ClipboardError, ClipboardWriter};
use arboard::Clipboard;

/// System clipboard. Kept alive for the whole session so X11 selections
/// survive after a copy.
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let clipboard = match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                log::warn!("Clipboard not available: {}", e);
                None
            }
        };
        Self { clipboard }
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = self.clipboard.as_mut().ok_or(ClipboardError::Unavailable)?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))?;
        log::debug!("Copied {} chars to clipboard", text.len());
        Ok(())
    }
}
