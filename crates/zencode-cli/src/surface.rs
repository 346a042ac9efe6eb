//! Terminal stand-in for the editor widget.

use zencode_kernel::EditorSurface;
use zencode_types::{FontSize, Theme};

/// Reports buffer and style changes on stdout.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl EditorSurface for TerminalSurface {
    fn set_value(&self, code: &str) {
        println!("[editor] buffer loaded ({} lines)", code.lines().count());
    }

    fn set_font_size(&self, size: FontSize) {
        println!("[editor] font size {size}");
    }

    fn set_theme(&self, theme: Theme) {
        println!("[editor] theme {}", theme.label());
    }
}
