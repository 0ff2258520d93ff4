//! Tracing setup.
//!
//! The terminal is in raw mode while the shell runs, so log lines only
//! go to a file, and only when one was asked for.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{ Context, Result };
use tracing_subscriber::EnvFilter;


/// Installs a file subscriber if `path` is given.
pub fn init( path: Option<&Path> ) -> Result<()> {
    let Some( path ) = path else {
        return Ok(());
    };

    let file = File::create( path )
        .with_context( || format!( "Failed to create log file {}", path.display() ) )?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else( |_| EnvFilter::new( "info" ) );

    tracing_subscriber::fmt()
        .with_env_filter( filter )
        .with_writer( Mutex::new( file ) )
        .with_ansi( false )
        .with_thread_names( true )
        .try_init()
        .map_err( |e| anyhow::anyhow!( "Failed to install logger: {}", e ) )?;

    tracing::info!( "Logging to {}", path.display() );
    Ok(())
}
