//! The panels shown in the desktop's content area.
//!
//! Each panel owns only the state it needs while visible; replacing a
//! panel drops that state.

pub mod easter_egg;
pub mod files;
pub mod player;
pub mod setup;

pub use easter_egg::EasterEggScreen;
pub use files::FileManagerScreen;
pub use player::PlayerScreen;


/// Which panel a shortcut opens.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum PanelKind {
    Player,
    EasterEgg,
    Files,
}


impl PanelKind {
    /// Shortcut order on the desktop bar.
    pub const ALL: [PanelKind; 3] = [ PanelKind::Player, PanelKind::EasterEgg, PanelKind::Files ];


    /// Label on the shortcut button.
    pub fn label( &self ) -> &'static str {
        match self {
            PanelKind::Player => "MP3 Плеер",
            PanelKind::EasterEgg => "Настройки",
            PanelKind::Files => "Мои файлы",
        }
    }
}


/// A live panel with its state.
#[derive( Debug )]
pub enum Panel {
    Player( PlayerScreen ),
    EasterEgg( EasterEggScreen ),
    Files( FileManagerScreen ),
}


impl Panel {
    pub fn kind( &self ) -> PanelKind {
        match self {
            Panel::Player( _ ) => PanelKind::Player,
            Panel::EasterEgg( _ ) => PanelKind::EasterEgg,
            Panel::Files( _ ) => PanelKind::Files,
        }
    }
}
