//! MP3 player panel
//!
//! Picks a file from an `.mp3`-only browser and plays it in the
//! background. Every Play press starts a new task; Stop cancels all of
//! them. Task results come back over a channel drained by [`PlayerScreen::poll_events`].

use std::path::{ Path, PathBuf };
use std::sync::mpsc::{ self, Receiver, Sender };
use std::sync::Arc;

use crate::browser::FileBrowser;
use crate::playback::{ AudioBackend, PlaybackEvent, PlaybackTask };


/// Extension the track picker accepts.
pub const EXTENSION: &str = "mp3";

pub const PLAY_LABEL: &str = "Играть";
pub const STOP_LABEL: &str = "Стоп";

const STATUS_IDLE: &str = "Выберите MP3 файл";
const STATUS_STOPPED: &str = "Стоп";


#[derive( Debug )]
pub struct PlayerScreen {
    browser: FileBrowser,
    selected: Option<PathBuf>,
    status: String,
    tasks: Vec<PlaybackTask>,
    next_task_id: u64,
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
}


impl PlayerScreen {
    pub fn new( start_dir: PathBuf ) -> Self {
        let ( events_tx, events_rx ) = mpsc::channel();
        Self {
            browser: FileBrowser::with_extension( start_dir, EXTENSION ),
            selected: None,
            status: STATUS_IDLE.to_string(),
            tasks: Vec::new(),
            next_task_id: 0,
            events_tx,
            events_rx,
        }
    }


    pub fn browser( &self ) -> &FileBrowser {
        &self.browser
    }


    pub fn browser_mut( &mut self ) -> &mut FileBrowser {
        &mut self.browser
    }


    /// Status line text.
    pub fn status( &self ) -> &str {
        &self.status
    }


    /// The file Play will start.
    pub fn selected( &self ) -> Option<&Path> {
        self.selected.as_deref()
    }


    /// Number of playback tasks that have not reported back yet.
    pub fn active_tasks( &self ) -> usize {
        self.tasks.len()
    }


    /// Enters the highlighted directory, or picks the highlighted file.
    pub fn choose_selected( &mut self ) {
        if let Some( path ) = self.browser.enter_selected() {
            self.select_file( path );
        }
    }


    /// Records `path` as the track to play.
    pub fn select_file( &mut self, path: PathBuf ) {
        self.status = format!( "Выбран файл: {}", path.display() );
        tracing::debug!( "Selected {:?}", path );
        self.selected = Some( path );
    }


    /// Starts playing the selected file. Does nothing when none is selected.
    pub fn play( &mut self, backend: &Arc<dyn AudioBackend> ) {
        let Some( path ) = self.selected.clone() else {
            return;
        };

        let id = self.next_task_id;
        self.next_task_id += 1;

        match PlaybackTask::spawn( id, path.clone(), Arc::clone( backend ), self.events_tx.clone() ) {
            Ok( task ) => {
                self.tasks.push( task );
                self.status = format!( "Воспроизводится: {}", path.display() );
            }
            Err( e ) => {
                tracing::warn!( "Failed to start playback thread: {}", e );
                self.status = format!( "Ошибка воспроизведения: {}", e );
            }
        }
    }


    /// Cancels every running task.
    pub fn stop( &mut self ) {
        for task in &self.tasks {
            task.cancel();
        }
        tracing::info!( "Stop requested for {} playback task(s)", self.tasks.len() );
        self.status = STATUS_STOPPED.to_string();
    }


    /// Applies results reported by playback threads.
    pub fn poll_events( &mut self ) {
        while let Ok( event ) = self.events_rx.try_recv() {
            if let PlaybackEvent::Failed { message, .. } = &event {
                self.status = format!( "Ошибка воспроизведения: {}", message );
            }
            self.tasks.retain( |t| t.id() != event.id() );
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicBool, Ordering };
    use std::thread;
    use std::time::{ Duration, Instant };

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


    struct Broken;

    impl AudioBackend for Broken {
        fn play( &self, _path: &Path, _cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError> {
            Err( PlaybackError::Resample( "device gone".to_string() ) )
        }
    }


    fn screen() -> ( tempfile::TempDir, PlayerScreen ) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write( dir.path().join( "song.mp3" ), b"" ).unwrap();
        std::fs::write( dir.path().join( "cover.jpg" ), b"" ).unwrap();
        let screen = PlayerScreen::new( dir.path().to_path_buf() );
        ( dir, screen )
    }


    fn wait_until( screen: &mut PlayerScreen, done: impl Fn( &PlayerScreen ) -> bool ) {
        let deadline = Instant::now() + Duration::from_secs( 5 );
        while Instant::now() < deadline {
            screen.poll_events();
            if done( &*screen ) {
                return;
            }
            thread::sleep( Duration::from_millis( 5 ) );
        }
        panic!( "condition not reached; status = {:?}", screen.status() );
    }


    #[test]
    fn test_only_mp3_files_listed() {
        let ( _dir, screen ) = screen();
        let names: Vec<_> = screen.browser().visible_entries().iter().map( |e| e.name.clone() ).collect();
        assert_eq!( names, vec![ "..", "song.mp3" ] );
    }


    #[test]
    fn test_choose_selected_records_path() {
        let ( dir, mut screen ) = screen();
        assert_eq!( screen.status(), "Выберите MP3 файл" );

        screen.browser_mut().select_last();
        screen.choose_selected();

        let path = dir.path().join( "song.mp3" );
        assert_eq!( screen.selected(), Some( path.as_path() ) );
        assert_eq!( screen.status(), format!( "Выбран файл: {}", path.display() ) );
    }


    #[test]
    fn test_play_without_selection_does_nothing() {
        let ( _dir, mut screen ) = screen();
        let backend: Arc<dyn AudioBackend> = Arc::new( UntilCancelled );

        screen.play( &backend );
        assert_eq!( screen.active_tasks(), 0 );
        assert_eq!( screen.status(), "Выберите MP3 файл" );
    }


    #[test]
    fn test_play_twice_runs_two_tasks_and_stop_cancels_both() {
        let ( dir, mut screen ) = screen();
        let backend: Arc<dyn AudioBackend> = Arc::new( UntilCancelled );
        let path = dir.path().join( "song.mp3" );
        screen.select_file( path.clone() );

        screen.play( &backend );
        assert!( screen.status().starts_with( "Воспроизводится: " ) );
        assert!( screen.status().contains( &path.display().to_string() ) );

        screen.play( &backend );
        assert_eq!( screen.active_tasks(), 2 );

        screen.stop();
        assert_eq!( screen.status(), "Стоп" );
        assert!( screen.tasks.iter().all( PlaybackTask::is_cancelled ) );
        wait_until( &mut screen, |s| s.active_tasks() == 0 );
        assert_eq!( screen.status(), "Стоп" );
    }


    #[test]
    fn test_failure_reported_through_status() {
        let ( dir, mut screen ) = screen();
        let backend: Arc<dyn AudioBackend> = Arc::new( Broken );
        screen.select_file( dir.path().join( "song.mp3" ) );

        screen.play( &backend );
        wait_until( &mut screen, |s| s.active_tasks() == 0 );
        assert_eq!( screen.status(), "Ошибка воспроизведения: Resampling failed: device gone" );
    }
}
