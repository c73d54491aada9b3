//! Text-based detection over captured pane content.

/// Prompt input box: a cursor inside the box plus its bottom border.
const INPUT_BOX_CURSOR: &str = "│ >";
const BOX_BOTTOM_BORDER: &str = "╰─";

const WELCOME_BANNER: &str = "Welcome to Claude Code";
const PRODUCT_NAME: &str = "Claude Code";
/// Chrome that only the live UI shows next to the product name.
const UI_HINTS: &[&str] = &["cwd:", "/help for help", "Tip:"];
const UPDATE_INSTALLED: &str = "✓ Update installed";
const UPDATE_RESTART: &str = "Restart to apply";

/// Confirmation markers, matched case-insensitively.
pub const PROMPT_MARKERS: &[&str] = &["Do you want to", "Would you like to", "Proceed?", "❯ 1. Yes"];

/// Fallback used when process inspection could not identify the pane.
///
/// The product name alone is not enough: reports and logs that mention
/// Claude Code must also carry the box border and a live-UI hint.
pub fn looks_like_target(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    has_input_cursor(text)
        || text.contains(WELCOME_BANNER)
        || has_interface_chrome(text)
        || (text.contains(UPDATE_INSTALLED) && text.contains(UPDATE_RESTART))
}

/// Whether the content shows a confirmation prompt worth answering.
pub fn has_prompt(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    PROMPT_MARKERS
        .iter()
        .any(|marker| lower.contains(&marker.to_lowercase()))
}

fn has_input_cursor(text: &str) -> bool {
    text.contains(INPUT_BOX_CURSOR) && text.contains(BOX_BOTTOM_BORDER)
}

fn has_interface_chrome(text: &str) -> bool {
    text.contains(PRODUCT_NAME)
        && text.contains(BOX_BOTTOM_BORDER)
        && UI_HINTS.iter().any(|hint| text.contains(hint))
}
