//! Navigation shell
//!
//! Owns the settings, the single active screen, the clock and any open
//! notification. The terminal front end forwards user actions here and
//! renders whatever [`Shell::screen`] reports.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{ DateTime, Local };

use crate::opener::{ Opener, SystemOpener };
use crate::playback::{ AudioBackend, SystemAudio };
use crate::screens::{ EasterEggScreen, FileManagerScreen, Panel, PanelKind, PlayerScreen };
use crate::settings::{ Settings, SettingsError, SettingsStore };



/// Severity of a notification.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum NotificationKind {
    Success,
    Error,
}


/// A modal message shown over the desktop until dismissed.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}


impl Notification {
    pub fn success( title: impl Into<String>, message: impl Into<String> ) -> Self {
        Self { title: title.into(), message: message.into(), kind: NotificationKind::Success }
    }


    pub fn error( title: impl Into<String>, message: impl Into<String> ) -> Self {
        Self { title: title.into(), message: message.into(), kind: NotificationKind::Error }
    }
}


/// The top-level screen.
#[derive( Debug )]
pub enum Screen {
    /// First-run license acceptance
    Setup,

    /// Clock and shortcut bar, with at most one panel open
    Desktop( Option<Panel> ),
}


/// Side-effect providers the screens need.
pub struct Services {
    pub audio: Arc<dyn AudioBackend>,
    pub opener: Box<dyn Opener>,
    /// Directory the browsers start in
    pub start_dir: PathBuf,
}


impl Services {
    /// Real audio output and the OS file opener.
    pub fn system( start_dir: PathBuf ) -> Self {
        Self {
            audio: Arc::new( SystemAudio ),
            opener: Box::new( SystemOpener ),
            start_dir,
        }
    }
}


pub struct Shell {
    store: SettingsStore,
    settings: Settings,
    screen: Screen,
    services: Services,
    clock: String,
    notification: Option<Notification>,
}


impl Shell {
    /// Loads settings and picks the first screen.
    pub fn start( store: SettingsStore, services: Services ) -> Result<Self, SettingsError> {
        let settings = store.load()?;

        let mut shell = Self {
            store,
            screen: Screen::Setup,
            settings,
            services,
            clock: String::new(),
            notification: None,
        };

        if shell.settings.first_run {
            tracing::info!( "First run, showing setup" );
        } else {
            shell.enter_desktop();
        }
        Ok( shell )
    }


    pub fn screen( &self ) -> &Screen {
        &self.screen
    }


    pub fn settings( &self ) -> &Settings {
        &self.settings
    }


    /// Current clock text, empty until the desktop is shown.
    pub fn clock( &self ) -> &str {
        &self.clock
    }


    pub fn notification( &self ) -> Option<&Notification> {
        self.notification.as_ref()
    }


    pub fn is_setup( &self ) -> bool {
        matches!( self.screen, Screen::Setup )
    }


    /// The open panel, if any.
    pub fn panel( &self ) -> Option<&Panel> {
        match &self.screen {
            Screen::Desktop( panel ) => panel.as_ref(),
            Screen::Setup => None,
        }
    }


    pub fn panel_mut( &mut self ) -> Option<&mut Panel> {
        match &mut self.screen {
            Screen::Desktop( panel ) => panel.as_mut(),
            Screen::Setup => None,
        }
    }


    fn enter_desktop( &mut self ) {
        self.screen = Screen::Desktop( None );
        self.tick();
    }


    /// Accepts the license: clears the first-run flag, saves, shows the desktop.
    ///
    /// On a save error the shell stays on the setup screen.
    pub fn accept_license( &mut self ) -> Result<(), SettingsError> {
        if !self.is_setup() {
            return Ok(());
        }

        let mut updated = self.settings.clone();
        updated.first_run = false;
        self.store.save( &updated )?;
        self.settings = updated;

        tracing::info!( "License accepted" );
        self.enter_desktop();
        Ok(())
    }


    /// Replaces the open panel with a fresh `kind` panel.
    pub fn open( &mut self, kind: PanelKind ) {
        let Screen::Desktop( panel ) = &mut self.screen else {
            return;
        };

        let start_dir = self.services.start_dir.clone();
        *panel = Some( match kind {
            PanelKind::Player => Panel::Player( PlayerScreen::new( start_dir ) ),
            PanelKind::EasterEgg => Panel::EasterEgg( EasterEggScreen::new() ),
            PanelKind::Files => Panel::Files( FileManagerScreen::new( start_dir ) ),
        });
        tracing::info!( "Opened {:?}", kind );
    }


    /// Closes the open panel, leaving the bare desktop.
    pub fn close_panel( &mut self ) {
        if let Screen::Desktop( panel ) = &mut self.screen {
            if let Some( old ) = panel.take() {
                tracing::debug!( "Closed {:?}", old.kind() );
            }
        }
    }


    pub fn notify( &mut self, notification: Notification ) {
        self.notification = Some( notification );
    }


    pub fn dismiss_notification( &mut self ) {
        self.notification = None;
    }


    /// Refreshes the clock and applies playback results.
    ///
    /// The front end calls this several times a second, so the clock
    /// never lags the wall time by a full second.
    pub fn tick( &mut self ) {
        self.tick_at( Local::now() );
    }


    /// [`Shell::tick`] at an explicit wall-clock time.
    pub fn tick_at( &mut self, wall: DateTime<Local> ) {
        if self.is_setup() {
            return;
        }

        self.clock = clock_text( &wall );

        if let Some( Panel::Player( player ) ) = self.panel_mut() {
            player.poll_events();
        }
    }


    /// Play on the player panel.
    pub fn play( &mut self ) {
        let audio = Arc::clone( &self.services.audio );
        if let Some( Panel::Player( player ) ) = self.panel_mut() {
            player.play( &audio );
        }
    }


    /// Stop on the player panel.
    pub fn stop( &mut self ) {
        if let Some( Panel::Player( player ) ) = self.panel_mut() {
            player.stop();
        }
    }


    /// Checks the easter-egg code and shows the result.
    pub fn check_secret( &mut self ) {
        let note = match self.panel() {
            Some( Panel::EasterEgg( screen ) ) => screen.check(),
            _ => return,
        };
        self.notify( note );
    }


    /// Opens the file manager's selection.
    pub fn open_selected( &mut self ) {
        let Screen::Desktop( Some( Panel::Files( files ) ) ) = &mut self.screen else {
            return;
        };
        if let Some( note ) = files.open_selected( self.services.opener.as_ref() ) {
            self.notification = Some( note );
        }
    }
}


/// Formats the status-bar clock.
pub fn clock_text( time: &DateTime<Local> ) -> String {
    format!( "Время: {}", time.format( "%H:%M:%S" ) )
}


#[cfg( test )]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{ AtomicBool, Ordering };
    use std::thread;
    use std::time::{ Duration, Instant };

    use chrono::TimeZone;

    use crate::opener::OpenError;
    use crate::playback::{ PlaybackError, PlaybackOutcome };


    struct UntilCancelled;

    impl AudioBackend for UntilCancelled {
        fn play( &self, _path: &Path, cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError> {
            while !cancel.load( Ordering::Relaxed ) {
                thread::sleep( Duration::from_millis( 1 ) );
            }
            Ok( PlaybackOutcome::Cancelled )
        }
    }


    struct Failing;

    impl AudioBackend for Failing {
        fn play( &self, _path: &Path, _cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError> {
            Err( PlaybackError::Resample( "bad stream".to_string() ) )
        }
    }


    struct Refuses;

    impl Opener for Refuses {
        fn open( &self, path: &Path ) -> Result<(), OpenError> {
            Err( OpenError::NotFound( path.to_path_buf() ) )
        }
    }


    struct Fixture {
        dir: tempfile::TempDir,
        settings_path: PathBuf,
    }


    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let settings_path = dir.path().join( "appdata" ).join( "settings.json" );
            fs::create_dir( dir.path().join( "music" ) ).unwrap();
            fs::write( dir.path().join( "music" ).join( "song.mp3" ), b"" ).unwrap();
            Self { dir, settings_path }
        }


        fn returning_user( self ) -> Self {
            fs::create_dir_all( self.settings_path.parent().unwrap() ).unwrap();
            fs::write( &self.settings_path, r#"{"first_run": false}"# ).unwrap();
            self
        }


        fn start_with( &self, audio: Arc<dyn AudioBackend> ) -> Shell {
            let services = Services {
                audio,
                opener: Box::new( Refuses ),
                start_dir: self.dir.path().join( "music" ),
            };
            Shell::start( SettingsStore::at( &self.settings_path ), services ).unwrap()
        }


        fn start( &self ) -> Shell {
            self.start_with( Arc::new( UntilCancelled ) )
        }
    }


    fn player( shell: &mut Shell ) -> &mut PlayerScreen {
        match shell.panel_mut() {
            Some( Panel::Player( player ) ) => player,
            other => panic!( "expected player, got {:?}", other ),
        }
    }


    #[test]
    fn test_first_launch_shows_setup_then_desktop() {
        let fx = Fixture::new();
        let mut shell = fx.start();

        assert!( shell.is_setup() );
        assert!( !fx.settings_path.exists() );
        assert_eq!( shell.clock(), "" );

        shell.accept_license().unwrap();

        assert!( matches!( shell.screen(), Screen::Desktop( None ) ) );
        assert!( !shell.settings().first_run );
        assert!( !shell.clock().is_empty() );

        let saved = SettingsStore::at( &fx.settings_path ).load().unwrap();
        assert!( !saved.first_run );
    }


    #[test]
    fn test_returning_user_skips_setup() {
        let fx = Fixture::new().returning_user();
        let shell = fx.start();

        assert!( matches!( shell.screen(), Screen::Desktop( None ) ) );
        assert!( shell.clock().starts_with( "Время: " ) );
    }


    #[test]
    fn test_corrupt_settings_abort_start() {
        let fx = Fixture::new();
        fs::create_dir_all( fx.settings_path.parent().unwrap() ).unwrap();
        fs::write( &fx.settings_path, "not json" ).unwrap();

        let services = Services::system( fx.dir.path().to_path_buf() );
        let result = Shell::start( SettingsStore::at( &fx.settings_path ), services );
        assert!( matches!( result, Err( SettingsError::Parse { .. } ) ) );
    }


    #[test]
    fn test_panels_ignored_during_setup() {
        let fx = Fixture::new();
        let mut shell = fx.start();

        shell.open( PanelKind::Player );
        assert!( shell.is_setup() );
        assert!( shell.panel().is_none() );
    }


    #[test]
    fn test_switching_panels_discards_state() {
        let fx = Fixture::new().returning_user();
        let mut shell = fx.start();

        shell.open( PanelKind::Player );
        player( &mut shell ).select_file( PathBuf::from( "x.mp3" ) );
        shell.play();
        assert_eq!( player( &mut shell ).active_tasks(), 1 );

        shell.open( PanelKind::Files );
        assert_eq!( shell.panel().map( Panel::kind ), Some( PanelKind::Files ) );

        shell.open( PanelKind::Player );
        assert_eq!( player( &mut shell ).selected(), None );
        assert_eq!( player( &mut shell ).active_tasks(), 0 );

        shell.close_panel();
        assert!( matches!( shell.screen(), Screen::Desktop( None ) ) );
    }


    #[test]
    fn test_play_twice_spawns_two_tasks() {
        let fx = Fixture::new().returning_user();
        let mut shell = fx.start();
        let song = fx.dir.path().join( "music" ).join( "song.mp3" );

        shell.open( PanelKind::Player );
        player( &mut shell ).browser_mut().select_last();
        player( &mut shell ).choose_selected();
        shell.play();
        shell.play();

        let p = player( &mut shell );
        assert_eq!( p.active_tasks(), 2 );
        assert_eq!( p.status(), format!( "Воспроизводится: {}", song.display() ) );

        shell.stop();
        assert_eq!( player( &mut shell ).status(), "Стоп" );
    }


    #[test]
    fn test_playback_failure_arrives_on_tick() {
        let fx = Fixture::new().returning_user();
        let mut shell = fx.start_with( Arc::new( Failing ) );

        shell.open( PanelKind::Player );
        player( &mut shell ).select_file( PathBuf::from( "x.mp3" ) );
        shell.play();

        let deadline = Instant::now() + Duration::from_secs( 5 );
        while player( &mut shell ).active_tasks() > 0 && Instant::now() < deadline {
            thread::sleep( Duration::from_millis( 5 ) );
            shell.tick();
        }
        assert_eq!( player( &mut shell ).status(), "Ошибка воспроизведения: Resampling failed: bad stream" );
    }


    #[test]
    fn test_secret_check_notifies() {
        let fx = Fixture::new().returning_user();
        let mut shell = fx.start();

        shell.open( PanelKind::EasterEgg );
        if let Some( Panel::EasterEgg( screen ) ) = shell.panel_mut() {
            "секрет".chars().for_each( |c| screen.input_mut().insert( c ) );
        }
        shell.check_secret();
        assert_eq!( shell.notification().map( |n| n.kind ), Some( NotificationKind::Success ) );

        shell.dismiss_notification();
        assert!( shell.notification().is_none() );

        if let Some( Panel::EasterEgg( screen ) ) = shell.panel_mut() {
            screen.input_mut().move_home();
            screen.input_mut().delete();
            screen.input_mut().insert( 'С' );
        }
        shell.check_secret();
        assert_eq!( shell.notification().map( |n| n.kind ), Some( NotificationKind::Error ) );
    }


    #[test]
    fn test_open_failure_notifies_and_keeps_running() {
        let fx = Fixture::new().returning_user();
        let mut shell = fx.start();

        shell.open( PanelKind::Files );
        if let Some( Panel::Files( files ) ) = shell.panel_mut() {
            files.browser_mut().select_last();
        }
        shell.open_selected();

        let note = shell.notification().unwrap();
        assert_eq!( note.kind, NotificationKind::Error );
        assert!( note.message.starts_with( "Не удалось открыть файл" ) );
        assert_eq!( shell.panel().map( Panel::kind ), Some( PanelKind::Files ) );
    }


    #[test]
    fn test_clock_shows_new_second_on_next_tick() {
        let fx = Fixture::new().returning_user();
        let mut shell = fx.start();
        let at = |h, m, s| Local.with_ymd_and_hms( 2024, 3, 1, h, m, s ).unwrap();

        shell.tick_at( at( 9, 0, 0 ) );
        assert_eq!( shell.clock(), "Время: 09:00:00" );

        // Ticks a fraction of a second apart still pick up the wall second
        shell.tick_at( at( 9, 0, 1 ) );
        assert_eq!( shell.clock(), "Время: 09:00:01" );

        shell.tick_at( at( 9, 0, 1 ) );
        assert_eq!( shell.clock(), "Время: 09:00:01" );

        shell.tick_at( at( 23, 59, 59 ) );
        assert_eq!( shell.clock(), "Время: 23:59:59" );
    }


    #[test]
    fn test_clock_frozen_during_setup() {
        let fx = Fixture::new();
        let mut shell = fx.start();

        shell.tick_at( Local.with_ymd_and_hms( 2024, 3, 1, 12, 0, 0 ).unwrap() );
        assert_eq!( shell.clock(), "" );
    }


    #[test]
    fn test_clock_format() {
        let time = Local.with_ymd_and_hms( 2024, 1, 2, 0, 0, 3 ).unwrap();
        assert_eq!( clock_text( &time ), "Время: 00:00:03" );
    }
}
