//! ComfortTE Core - desktop shell state
//!
//! This crate holds everything the desktop shell does that is not tied
//! to a terminal: the persisted settings, the navigation state machine,
//! the individual screens, the file browser and the audio playback engine.

pub mod browser;
pub mod decoder;
pub mod input;
pub mod opener;
pub mod output;
pub mod playback;
pub mod screens;
pub mod settings;
pub mod shell;

pub use browser::{ BrowserEntry, FileBrowser };
pub use input::InputBuffer;
pub use opener::{ OpenError, Opener, SystemOpener };
pub use playback::{ AudioBackend, PlaybackError, PlaybackEvent, PlaybackOutcome, PlaybackTask, SystemAudio };
pub use screens::{ Panel, PanelKind };
pub use settings::{ Settings, SettingsError, SettingsStore };
pub use shell::{ Notification, NotificationKind, Screen, Services, Shell };
