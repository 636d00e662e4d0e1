use std::time::Duration;

use crate::error::ClipboardError;

/// How long the "Copied" indicator stays up
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_millis(2000);

pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}
