//! Command-line argument parsing for ComfortTE.

use std::path::PathBuf;

use clap::Parser;


/// ComfortTE - a small desktop shell for the terminal.
#[derive( Parser, Debug )]
#[command( name = "comfortte" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Settings file to use instead of the per-user default.
    #[arg( short, long, value_name = "FILE" )]
    pub settings: Option<PathBuf>,

    /// Directory the player and file manager start in.
    #[arg( short, long, value_name = "DIR" )]
    pub dir: Option<PathBuf>,

    /// Write log output to this file (filtered by RUST_LOG).
    #[arg( short, long, value_name = "FILE" )]
    pub log: Option<PathBuf>,
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([ "comfortte", "--settings", "/tmp/s.json", "-d", "/music" ]);
        assert_eq!( args.settings, Some( PathBuf::from( "/tmp/s.json" ) ) );
        assert_eq!( args.dir, Some( PathBuf::from( "/music" ) ) );
        assert_eq!( args.log, None );
    }


    #[test]
    fn test_no_flags() {
        let args = Args::parse_from([ "comfortte" ]);
        assert!( args.settings.is_none() && args.dir.is_none() && args.log.is_none() );
    }
}
