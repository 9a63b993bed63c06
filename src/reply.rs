//! Outbound reply types and long-message chunking

/// Texts longer than this many characters are split
pub const CHUNK_THRESHOLD: usize = 4000;
/// Characters per chunk once a text is split
pub const CHUNK_SIZE: usize = 3800;
/// Buttons per keyboard row
pub const MENU_ROW_WIDTH: usize = 2;

/// One selectable menu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub id: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

/// A prompt with an ordered list of choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub prompt: String,
    pub options: Vec<MenuOption>,
}

impl Menu {
    pub fn new(prompt: impl Into<String>, options: Vec<MenuOption>) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }

    /// Options grouped into rows of [`MENU_ROW_WIDTH`]
    pub fn rows(&self) -> impl Iterator<Item = &[MenuOption]> {
        self.options.chunks(MENU_ROW_WIDTH)
    }
}

/// Something the core asks the transport to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Menu(Menu),
}

/// Split generated text into transport-safe chunks.
///
/// Offsets are fixed character positions; words and markdown blocks may be
/// cut in half.
pub fn split_reply(text: &str) -> Vec<String> {
    if text.chars().count() <= CHUNK_THRESHOLD {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(CHUNK_SIZE)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
