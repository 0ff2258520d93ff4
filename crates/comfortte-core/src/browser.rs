//! File browser for directory navigation.
//!
//! Backs both the player's track picker (restricted to one extension)
//! and the unfiltered file manager.

use std::fs;
use std::path::{ Path, PathBuf };


/// A file or directory entry in the browser.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct BrowserEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}


impl BrowserEntry {
    /// Returns true for the synthetic parent-directory entry.
    pub fn is_parent( &self ) -> bool {
        self.name == ".."
    }
}


/// File browser state.
#[derive( Debug )]
pub struct FileBrowser {
    current_dir: PathBuf,
    /// Lowercase extension files must carry to be listed
    extension: Option<String>,
    entries: Vec<BrowserEntry>,
    filtered_indices: Vec<usize>,
    selected: usize,
    filter: String,
}


impl FileBrowser {
    /// Creates a browser at `path` listing every file.
    pub fn new( path: PathBuf ) -> Self {
        Self::build( path, None )
    }


    /// Creates a browser at `path` that only lists files with `extension`.
    pub fn with_extension( path: PathBuf, extension: &str ) -> Self {
        Self::build( path, Some( extension.trim_start_matches( '.' ).to_lowercase() ) )
    }


    fn build( path: PathBuf, extension: Option<String> ) -> Self {
        let mut browser = Self {
            current_dir: path,
            extension,
            entries: Vec::new(),
            filtered_indices: Vec::new(),
            selected: 0,
            filter: String::new(),
        };
        browser.refresh();
        browser
    }


    /// Re-reads the current directory.
    ///
    /// An unreadable directory yields an empty listing (plus `..`).
    pub fn refresh( &mut self ) {
        self.entries.clear();
        self.filtered_indices.clear();
        self.selected = 0;

        if let Some( parent ) = self.current_dir.parent() {
            self.entries.push( BrowserEntry {
                path: parent.to_path_buf(),
                name: "..".to_string(),
                is_dir: true,
            });
        }

        let mut dirs = Vec::new();
        let mut files = Vec::new();

        match fs::read_dir( &self.current_dir ) {
            Ok( entries ) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let name = entry.file_name().to_string_lossy().to_string();

                    if name.starts_with( '.' ) {
                        continue;
                    }

                    let is_dir = path.is_dir();
                    if !is_dir && !self.accepts( &path ) {
                        continue;
                    }

                    let browser_entry = BrowserEntry { path, name, is_dir };
                    if is_dir {
                        dirs.push( browser_entry );
                    } else {
                        files.push( browser_entry );
                    }
                }
            }
            Err( e ) => {
                tracing::warn!( "Failed to read directory {:?}: {}", self.current_dir, e );
            }
        }

        dirs.sort_by_key( |e| e.name.to_lowercase() );
        files.sort_by_key( |e| e.name.to_lowercase() );

        self.entries.extend( dirs );
        self.entries.extend( files );

        self.apply_filter();
    }


    fn accepts( &self, path: &Path ) -> bool {
        match &self.extension {
            None => true,
            Some( wanted ) => path.extension()
                .and_then( |e| e.to_str() )
                .map( |e| e.to_lowercase() == *wanted )
                .unwrap_or( false ),
        }
    }


    /// Navigates to a directory, relative paths resolving against the current one.
    ///
    /// Paths that are not directories are ignored.
    pub fn navigate_to( &mut self, path: &Path ) {
        let target = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join( path )
        };

        if target.is_dir() {
            self.current_dir = target;
            self.filter.clear();
            self.refresh();
        }
    }


    /// Enters the selected directory or returns the selected file path.
    ///
    /// @returns Some(path) if a file was selected, None if entered a directory
    pub fn enter_selected( &mut self ) -> Option<PathBuf> {
        let entry = self.selected_entry()?.clone();
        if entry.is_dir {
            self.navigate_to( &entry.path );
            None
        } else {
            Some( entry.path )
        }
    }


    /// Goes up to the parent directory.
    pub fn go_up( &mut self ) {
        if let Some( parent ) = self.current_dir.parent() {
            let parent = parent.to_path_buf();
            self.navigate_to( &parent );
        }
    }


    /// Sets the filter text and updates visible entries.
    pub fn set_filter( &mut self, filter: String ) {
        self.filter = filter;
        self.apply_filter();
    }


    /// Clears the filter.
    pub fn clear_filter( &mut self ) {
        self.filter.clear();
        self.apply_filter();
    }


    /// Gets the current filter.
    pub fn filter( &self ) -> &str {
        &self.filter
    }


    fn apply_filter( &mut self ) {
        self.filtered_indices.clear();

        let filter_lower = self.filter.to_lowercase();

        for ( idx, entry ) in self.entries.iter().enumerate() {
            if entry.is_parent()
                || self.filter.is_empty()
                || entry.name.to_lowercase().contains( &filter_lower )
            {
                self.filtered_indices.push( idx );
            }
        }

        if self.selected >= self.filtered_indices.len() {
            self.selected = self.filtered_indices.len().saturating_sub( 1 );
        }
    }


    /// Moves selection down, wrapping at the end.
    pub fn select_next( &mut self ) {
        if !self.filtered_indices.is_empty() {
            self.selected = ( self.selected + 1 ) % self.filtered_indices.len();
        }
    }


    /// Moves selection up, wrapping at the start.
    pub fn select_previous( &mut self ) {
        if !self.filtered_indices.is_empty() {
            self.selected = if self.selected == 0 {
                self.filtered_indices.len() - 1
            } else {
                self.selected - 1
            };
        }
    }


    pub fn select_first( &mut self ) {
        self.selected = 0;
    }


    pub fn select_last( &mut self ) {
        self.selected = self.filtered_indices.len().saturating_sub( 1 );
    }


    /// Gets the currently selected entry.
    pub fn selected_entry( &self ) -> Option<&BrowserEntry> {
        self.filtered_indices
            .get( self.selected )
            .and_then( |&idx| self.entries.get( idx ) )
    }


    /// Gets visible entries (filtered).
    pub fn visible_entries( &self ) -> Vec<&BrowserEntry> {
        self.filtered_indices
            .iter()
            .filter_map( |&idx| self.entries.get( idx ) )
            .collect()
    }


    /// Gets the selected index for UI state.
    pub fn selected_index( &self ) -> usize {
        self.selected
    }


    /// Gets the current directory path.
    pub fn current_dir( &self ) -> &Path {
        &self.current_dir
    }


    /// Gets the total number of visible entries.
    pub fn len( &self ) -> usize {
        self.filtered_indices.len()
    }


    /// Returns true if there are no visible entries.
    pub fn is_empty( &self ) -> bool {
        self.filtered_indices.is_empty()
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir( dir.path().join( "Albums" ) ).unwrap();
        fs::create_dir( dir.path().join( "docs" ) ).unwrap();
        fs::write( dir.path().join( "song.mp3" ), b"" ).unwrap();
        fs::write( dir.path().join( "Loud.MP3" ), b"" ).unwrap();
        fs::write( dir.path().join( "notes.txt" ), b"" ).unwrap();
        fs::write( dir.path().join( ".hidden.mp3" ), b"" ).unwrap();
        dir
    }


    fn names( browser: &FileBrowser ) -> Vec<String> {
        browser.visible_entries().iter().map( |e| e.name.clone() ).collect()
    }


    #[test]
    fn test_lists_directories_first_then_files() {
        let dir = fixture();
        let browser = FileBrowser::new( dir.path().to_path_buf() );

        assert_eq!( names( &browser ), vec![ "..", "Albums", "docs", "Loud.MP3", "notes.txt", "song.mp3" ] );
    }


    #[test]
    fn test_extension_filter_keeps_directories() {
        let dir = fixture();
        let browser = FileBrowser::with_extension( dir.path().to_path_buf(), ".mp3" );

        assert_eq!( names( &browser ), vec![ "..", "Albums", "docs", "Loud.MP3", "song.mp3" ] );
    }


    #[test]
    fn test_text_filter_always_shows_parent() {
        let dir = fixture();
        let mut browser = FileBrowser::new( dir.path().to_path_buf() );

        browser.set_filter( "SONG".to_string() );
        assert_eq!( names( &browser ), vec![ "..", "song.mp3" ] );

        browser.clear_filter();
        assert_eq!( browser.len(), 6 );
    }


    #[test]
    fn test_enter_selected_directory_then_file() {
        let dir = fixture();
        fs::write( dir.path().join( "Albums" ).join( "track.mp3" ), b"" ).unwrap();
        let mut browser = FileBrowser::with_extension( dir.path().to_path_buf(), "mp3" );

        browser.select_next(); // Albums
        assert_eq!( browser.enter_selected(), None );
        assert_eq!( browser.current_dir(), dir.path().join( "Albums" ) );

        browser.select_last();
        assert_eq!( browser.enter_selected(), Some( dir.path().join( "Albums" ).join( "track.mp3" ) ) );

        browser.go_up();
        assert_eq!( browser.current_dir(), dir.path() );
    }


    #[test]
    fn test_selection_wraps() {
        let dir = fixture();
        let mut browser = FileBrowser::new( dir.path().to_path_buf() );

        browser.select_previous();
        assert_eq!( browser.selected_index(), browser.len() - 1 );
        browser.select_next();
        assert_eq!( browser.selected_index(), 0 );
    }


    #[test]
    fn test_missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FileBrowser::new( dir.path().join( "gone" ) );

        assert_eq!( names( &browser ), vec![ ".." ] );
    }
}
