//! File manager panel: browse anything, open files with the OS handler.

use std::path::PathBuf;

use crate::browser::FileBrowser;
use crate::opener::Opener;
use crate::shell::Notification;


#[derive( Debug )]
pub struct FileManagerScreen {
    browser: FileBrowser,
}


impl FileManagerScreen {
    pub fn new( start_dir: PathBuf ) -> Self {
        Self { browser: FileBrowser::new( start_dir ) }
    }


    pub fn browser( &self ) -> &FileBrowser {
        &self.browser
    }


    pub fn browser_mut( &mut self ) -> &mut FileBrowser {
        &mut self.browser
    }


    /// Enters the selected directory, or opens the selected file.
    ///
    /// Returns a notification when the file could not be opened.
    pub fn open_selected( &mut self, opener: &dyn Opener ) -> Option<Notification> {
        let path = self.browser.enter_selected()?;

        match opener.open( &path ) {
            Ok(()) => None,
            Err( e ) => {
                tracing::warn!( "Failed to open {:?}: {}", path, e );
                Some( Notification::error( "Ошибка", format!( "Не удалось открыть файл: {}", e ) ) )
            }
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;

    use crate::opener::OpenError;
    use crate::shell::NotificationKind;


    #[derive( Default )]
    struct Recorder {
        opened: RefCell<Vec<PathBuf>>,
    }

    impl Opener for Recorder {
        fn open( &self, path: &Path ) -> Result<(), OpenError> {
            self.opened.borrow_mut().push( path.to_path_buf() );
            Ok(())
        }
    }


    struct NoHandler;

    impl Opener for NoHandler {
        fn open( &self, path: &Path ) -> Result<(), OpenError> {
            Err( OpenError::Launch {
                path: path.to_path_buf(),
                source: std::io::Error::new( std::io::ErrorKind::Other, "no application registered" ),
            })
        }
    }


    #[test]
    fn test_opens_selected_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write( dir.path().join( "readme.txt" ), b"hi" ).unwrap();
        let mut screen = FileManagerScreen::new( dir.path().to_path_buf() );
        screen.browser_mut().select_last();

        let opener = Recorder::default();
        assert!( screen.open_selected( &opener ).is_none() );
        assert_eq!( *opener.opened.borrow(), vec![ dir.path().join( "readme.txt" ) ] );
    }


    #[test]
    fn test_directory_is_entered_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir( dir.path().join( "sub" ) ).unwrap();
        let mut screen = FileManagerScreen::new( dir.path().to_path_buf() );
        screen.browser_mut().select_last();

        let opener = Recorder::default();
        assert!( screen.open_selected( &opener ).is_none() );
        assert!( opener.opened.borrow().is_empty() );
        assert_eq!( screen.browser().current_dir(), dir.path().join( "sub" ) );
    }


    #[test]
    fn test_open_failure_becomes_notification() {
        let dir = tempfile::tempdir().unwrap();
        fs::write( dir.path().join( "data.bin" ), b"" ).unwrap();
        let mut screen = FileManagerScreen::new( dir.path().to_path_buf() );
        screen.browser_mut().select_last();

        let note = screen.open_selected( &NoHandler ).unwrap();
        assert_eq!( note.kind, NotificationKind::Error );
        assert!( note.message.starts_with( "Не удалось открыть файл: " ) );
        assert!( note.message.contains( "no application registered" ) );
    }
}
