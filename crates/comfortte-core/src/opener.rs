//! Opening files with the operating system's default handler.

use std::io;
use std::path::{ Path, PathBuf };

use thiserror::Error;


/// Errors from handing a file to the OS.
#[derive( Debug, Error )]
pub enum OpenError {
    #[error( "{0:?} does not exist" )]
    NotFound( PathBuf ),

    #[error( "{path:?}: {source}" )]
    Launch { path: PathBuf, source: io::Error },
}


/// Launches the registered handler for a file.
pub trait Opener {
    fn open( &self, path: &Path ) -> Result<(), OpenError>;
}


/// Uses the desktop's default association (`xdg-open`, `open`, `start`).
#[derive( Debug, Default, Clone, Copy )]
pub struct SystemOpener;


impl Opener for SystemOpener {
    fn open( &self, path: &Path ) -> Result<(), OpenError> {
        if !path.exists() {
            return Err( OpenError::NotFound( path.to_path_buf() ) );
        }

        tracing::info!( "Opening {:?} with default handler", path );
        open::that_detached( path )
            .map_err( |source| OpenError::Launch { path: path.to_path_buf(), source } )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_missing_file_is_not_launched() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemOpener.open( &dir.path().join( "missing.txt" ) );

        assert!( matches!( result, Err( OpenError::NotFound( _ ) ) ) );
    }
}
