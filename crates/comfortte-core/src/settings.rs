//! Persistent settings
//!
//! A small JSON record stored under the per-user application-data
//! directory. Only the first-run flag is interpreted; any other keys found
//! in the file are carried through untouched on save.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use thiserror::Error;


/// Directory name under the application-data directory.
const APP_DIR_NAME: &str = "ComfortableTE";

/// Settings file name.
const SETTINGS_FILE_NAME: &str = "settings.json";


/// Errors that can occur while loading or saving settings.
#[derive( Debug, Error )]
pub enum SettingsError {
    #[error( "No application data directory available" )]
    NoDataDir,

    #[error( "Failed to read settings from {path}: {source}" )]
    Read { path: PathBuf, source: io::Error },

    #[error( "Settings file {path} is corrupt: {source}" )]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error( "Failed to create settings directory {path}: {source}" )]
    CreateDir { path: PathBuf, source: io::Error },

    #[error( "Failed to write settings to {path}: {source}" )]
    Write { path: PathBuf, source: io::Error },

    #[error( "Failed to serialize settings: {0}" )]
    Serialize( #[from] serde_json::Error ),
}


/// Application settings.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct Settings {
    /// Show the license screen on the next start
    #[serde( default = "default_first_run" )]
    pub first_run: bool,

    /// Keys this version does not know about
    #[serde( flatten )]
    pub extra: BTreeMap<String, serde_json::Value>,
}


fn default_first_run() -> bool {
    true
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            first_run: default_first_run(),
            extra: BTreeMap::new(),
        }
    }
}


/// Reads and writes the settings file at a fixed location.
#[derive( Debug, Clone )]
pub struct SettingsStore {
    path: PathBuf,
}


impl SettingsStore {
    /// Creates a store at the default per-user location.
    pub fn new() -> Result<Self, SettingsError> {
        let path = Self::default_path().ok_or( SettingsError::NoDataDir )?;
        Ok( Self { path } )
    }


    /// Creates a store backed by an explicit file.
    pub fn at( path: impl Into<PathBuf> ) -> Self {
        Self { path: path.into() }
    }


    /// Returns the default settings file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map( |p| p.join( APP_DIR_NAME ).join( SETTINGS_FILE_NAME ) )
    }


    /// Returns the path this store reads and writes.
    pub fn path( &self ) -> &Path {
        &self.path
    }


    /// Loads settings from disk, or returns defaults if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error; the
    /// caller is expected to abort rather than silently reset the record.
    pub fn load( &self ) -> Result<Settings, SettingsError> {
        let contents = match fs::read_to_string( &self.path ) {
            Ok( contents ) => contents,
            Err( e ) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!( "No settings at {:?}, using defaults", self.path );
                return Ok( Settings::default() );
            }
            Err( source ) => {
                return Err( SettingsError::Read { path: self.path.clone(), source } );
            }
        };

        let settings: Settings = serde_json::from_str( &contents )
            .map_err( |source| SettingsError::Parse { path: self.path.clone(), source } )?;

        tracing::debug!( "Loaded settings from {:?}: {:?}", self.path, settings );
        Ok( settings )
    }


    /// Saves settings to disk, replacing the previous contents.
    pub fn save( &self, settings: &Settings ) -> Result<(), SettingsError> {
        if let Some( parent ) = self.path.parent() {
            fs::create_dir_all( parent )
                .map_err( |source| SettingsError::CreateDir { path: parent.to_path_buf(), source } )?;
        }

        let json = serde_json::to_string_pretty( settings )?;
        fs::write( &self.path, json )
            .map_err( |source| SettingsError::Write { path: self.path.clone(), source } )?;

        tracing::info!( "Saved settings to {:?}", self.path );
        Ok(())
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_missing_file_defaults_to_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at( dir.path().join( "settings.json" ) );

        let settings = store.load().unwrap();
        assert!( settings.first_run );
        assert!( settings.extra.is_empty() );
    }


    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "nested" ).join( "app" ).join( "settings.json" );
        let store = SettingsStore::at( &path );

        let settings = Settings { first_run: false, ..Settings::default() };
        store.save( &settings ).unwrap();
        assert!( path.exists() );

        // Saving twice is fine once the directory exists
        store.save( &settings ).unwrap();
        assert_eq!( store.load().unwrap(), settings );
    }


    #[test]
    fn test_load_reads_existing_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, r#"{"first_run": false}"# ).unwrap();

        let settings = SettingsStore::at( &path ).load().unwrap();
        assert!( !settings.first_run );
    }


    #[test]
    fn test_missing_key_defaults_to_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, "{}" ).unwrap();

        let settings = SettingsStore::at( &path ).load().unwrap();
        assert!( settings.first_run );
    }


    #[test]
    fn test_unknown_keys_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, r#"{"first_run": true, "theme": "dark", "volume": 7}"# ).unwrap();

        let store = SettingsStore::at( &path );
        let mut settings = store.load().unwrap();
        settings.first_run = false;
        store.save( &settings ).unwrap();

        let raw: serde_json::Value = serde_json::from_str( &fs::read_to_string( &path ).unwrap() ).unwrap();
        assert_eq!( raw[ "first_run" ], serde_json::Value::Bool( false ) );
        assert_eq!( raw[ "theme" ], serde_json::Value::from( "dark" ) );
        assert_eq!( raw[ "volume" ], serde_json::Value::from( 7 ) );
    }


    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, "{ first_run: nope" ).unwrap();

        let result = SettingsStore::at( &path ).load();
        assert!( matches!( result, Err( SettingsError::Parse { .. } ) ) );
    }


    #[test]
    fn test_wrong_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, r#"{"first_run": "yes"}"# ).unwrap();

        let result = SettingsStore::at( &path ).load();
        assert!( matches!( result, Err( SettingsError::Parse { .. } ) ) );
    }
}
