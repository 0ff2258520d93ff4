//! Input mode handling for the TUI.


/// Where typed characters go.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum InputMode {
    /// Keys are shortcuts.
    #[default]
    Normal,

    /// Typing narrows the open browser's listing.
    Filter,
}
