//! Background playback tasks
//!
//! A [`PlaybackTask`] plays one file on its own thread through an
//! [`AudioBackend`]. The UI keeps the task to cancel it and learns how it
//! ended from [`PlaybackEvent`]s sent over a channel; the playback thread
//! never touches UI state.

use std::io;
use std::path::{ Path, PathBuf };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rubato::{ FastFixedOut, PolynomialDegree, Resampler };
use thiserror::Error;

use crate::decoder::{ Decoder, DecoderError };
use crate::output::{ AudioOutput, OutputError, SampleBuffer };


/// Errors that can occur while playing a file.
#[derive( Debug, Error )]
pub enum PlaybackError {
    #[error( transparent )]
    Decoder( #[from] DecoderError ),

    #[error( transparent )]
    Output( #[from] OutputError ),

    #[error( "Resampling failed: {0}" )]
    Resample( String ),
}


/// How a blocking play call ended without error.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
}


/// Plays an audio file to completion.
pub trait AudioBackend: Send + Sync {
    /// Blocks until the file has played, `cancel` is set, or playback fails.
    fn play( &self, path: &Path, cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError>;
}


/// Reported by a playback thread when it exits.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum PlaybackEvent {
    Finished { id: u64 },
    Cancelled { id: u64 },
    Failed { id: u64, message: String },
}


impl PlaybackEvent {
    /// Returns the id of the task that sent the event.
    pub fn id( &self ) -> u64 {
        match self {
            PlaybackEvent::Finished { id }
            | PlaybackEvent::Cancelled { id }
            | PlaybackEvent::Failed { id, .. } => *id,
        }
    }
}


/// Handle to a playback thread.
///
/// Dropping the handle requests cancellation but does not wait for the thread.
#[derive( Debug )]
pub struct PlaybackTask {
    id: u64,
    path: PathBuf,
    cancel: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}


impl PlaybackTask {
    /// Starts playing `path` on a new thread.
    pub fn spawn(
        id: u64,
        path: PathBuf,
        backend: Arc<dyn AudioBackend>,
        events: Sender<PlaybackEvent>,
    ) -> io::Result<Self> {
        let cancel = Arc::new( AtomicBool::new( false ) );
        let thread_cancel = Arc::clone( &cancel );
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name( format!( "playback-{}", id ) )
            .spawn( move || {
                tracing::info!( "Playback {} started: {:?}", id, thread_path );
                let event = match backend.play( &thread_path, &thread_cancel ) {
                    Ok( PlaybackOutcome::Completed ) => PlaybackEvent::Finished { id },
                    Ok( PlaybackOutcome::Cancelled ) => PlaybackEvent::Cancelled { id },
                    Err( e ) => {
                        tracing::warn!( "Playback {} failed: {}", id, e );
                        PlaybackEvent::Failed { id, message: e.to_string() }
                    }
                };
                tracing::debug!( "Playback {} exiting: {:?}", id, event );
                // Receiver may be gone if the screen was closed
                let _ = events.send( event );
            })?;

        Ok( Self { id, path, cancel, thread } )
    }


    pub fn id( &self ) -> u64 {
        self.id
    }


    pub fn path( &self ) -> &Path {
        &self.path
    }


    /// Asks the thread to stop at its next check.
    pub fn cancel( &self ) {
        self.cancel.store( true, Ordering::Relaxed );
    }


    pub fn is_cancelled( &self ) -> bool {
        self.cancel.load( Ordering::Relaxed )
    }


    /// Returns true once the thread has exited.
    pub fn is_finished( &self ) -> bool {
        self.thread.is_finished()
    }
}


impl Drop for PlaybackTask {
    fn drop( &mut self ) {
        self.cancel();
    }
}


/// Plays through the default output device.
#[derive( Debug, Default, Clone, Copy )]
pub struct SystemAudio;


impl AudioBackend for SystemAudio {
    fn play( &self, path: &Path, cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError> {
        let mut decoder = Decoder::open( path )?;
        let channels = decoder.channels();
        let source_rate = decoder.sample_rate();

        let ( output, buffer ) = AudioOutput::new( source_rate, channels as u16 )?;

        let mut resampler = if output.sample_rate() != source_rate {
            tracing::info!( "Resampling: {} Hz → {} Hz", source_rate, output.sample_rate() );
            Some( Resampling::new( source_rate, output.sample_rate(), channels )? )
        } else {
            None
        };

        output.play()?;

        // Stay roughly 50ms ahead of the device
        let target_buffer = ( output.sample_rate() as usize * channels ) / 20;

        loop {
            if interrupted( &buffer, cancel )? {
                buffer.clear();
                return Ok( PlaybackOutcome::Cancelled );
            }

            if buffer.len() > target_buffer {
                thread::sleep( Duration::from_millis( 5 ) );
                continue;
            }

            match decoder.decode_next()? {
                Some( samples ) => {
                    let samples = match resampler.as_mut() {
                        Some( r ) => r.feed( &samples )?,
                        None => samples,
                    };
                    push_all( &buffer, &samples, cancel )?;
                }
                None => {
                    if let Some( r ) = resampler.as_mut() {
                        let tail = r.flush()?;
                        push_all( &buffer, &tail, cancel )?;
                    }
                    break;
                }
            }
        }

        drain( &buffer, channels, cancel )?;

        if cancel.load( Ordering::Relaxed ) {
            return Ok( PlaybackOutcome::Cancelled );
        }
        tracing::info!( "Reached end of {:?}", path );
        Ok( PlaybackOutcome::Completed )
    }
}


/// True when `cancel` is set. A dead output stream is an error instead.
fn interrupted( buffer: &SampleBuffer, cancel: &AtomicBool ) -> Result<bool, OutputError> {
    buffer.check()?;
    Ok( cancel.load( Ordering::Relaxed ) )
}


/// Pushes every sample, waiting for room, unless cancelled first.
fn push_all( buffer: &SampleBuffer, samples: &[f32], cancel: &AtomicBool ) -> Result<(), OutputError> {
    let mut offset = 0;
    while offset < samples.len() && !interrupted( buffer, cancel )? {
        let pushed = buffer.push( &samples[ offset.. ] );
        offset += pushed;
        if pushed == 0 {
            thread::sleep( Duration::from_millis( 5 ) );
        }
    }
    Ok(())
}


/// Waits for the device to play out what is queued.
fn drain( buffer: &SampleBuffer, channels: usize, cancel: &AtomicBool ) -> Result<(), OutputError> {
    // A trailing partial frame is never consumed by the device
    while buffer.len() >= channels && !interrupted( buffer, cancel )? {
        thread::sleep( Duration::from_millis( 10 ) );
    }
    Ok(())
}


/// Sample-rate conversion over an interleaved stream.
struct Resampling {
    resampler: FastFixedOut<f32>,
    /// Planar input not yet consumed by the resampler
    pending: Vec<Vec<f32>>,
}


impl Resampling {
    fn new( from: u32, to: u32, channels: usize ) -> Result<Self, PlaybackError> {
        let resampler = FastFixedOut::<f32>::new(
            to as f64 / from as f64,
            2.0,
            PolynomialDegree::Cubic,
            1024,
            channels,
        ).map_err( |e| PlaybackError::Resample( e.to_string() ) )?;

        Ok( Self {
            resampler,
            pending: vec![ Vec::new(); channels ],
        })
    }


    /// Queues interleaved input and returns whatever full chunks produce.
    fn feed( &mut self, samples: &[f32] ) -> Result<Vec<f32>, PlaybackError> {
        deinterleave_into( samples, &mut self.pending );

        let mut out = Vec::new();
        while self.pending[ 0 ].len() >= self.resampler.input_frames_next() {
            let needed = self.resampler.input_frames_next();
            let chunk: Vec<Vec<f32>> = self.pending
                .iter_mut()
                .map( |ch| ch.drain( ..needed ).collect() )
                .collect();

            let resampled = self.resampler
                .process( &chunk, None )
                .map_err( |e| PlaybackError::Resample( e.to_string() ) )?;
            out.extend( interleave( &resampled ) );
        }
        Ok( out )
    }


    /// Resamples whatever input is left at end of stream.
    fn flush( &mut self ) -> Result<Vec<f32>, PlaybackError> {
        if self.pending[ 0 ].is_empty() {
            return Ok( Vec::new() );
        }
        let resampled = self.resampler
            .process_partial( Some( self.pending.as_slice() ), None )
            .map_err( |e| PlaybackError::Resample( e.to_string() ) )?;
        self.pending.iter_mut().for_each( Vec::clear );
        Ok( interleave( &resampled ) )
    }
}


/// [L0, R0, L1, R1, ...] appended onto [[L...], [R...]]
fn deinterleave_into( samples: &[f32], planar: &mut [Vec<f32>] ) {
    let channels = planar.len();
    for frame in samples.chunks_exact( channels ) {
        for ( ch, sample ) in planar.iter_mut().zip( frame ) {
            ch.push( *sample );
        }
    }
}


/// [[L0, L1, ...], [R0, R1, ...]] → [L0, R0, L1, R1, ...]
fn interleave( channels: &[Vec<f32>] ) -> Vec<f32> {
    let frames = channels.first().map( Vec::len ).unwrap_or( 0 );
    let mut out = Vec::with_capacity( frames * channels.len() );
    for f in 0..frames {
        for ch in channels {
            out.push( ch[ f ] );
        }
    }
    out
}


#[cfg( test )]
mod tests {
    use super::*;
    use std::sync::mpsc;


    const WAIT: Duration = Duration::from_secs( 5 );


    struct Immediate( Result<PlaybackOutcome, &'static str> );

    impl AudioBackend for Immediate {
        fn play( &self, _path: &Path, _cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError> {
            self.0.map_err( |m| PlaybackError::Resample( m.to_string() ) )
        }
    }


    struct UntilCancelled;

    impl AudioBackend for UntilCancelled {
        fn play( &self, _path: &Path, cancel: &AtomicBool ) -> Result<PlaybackOutcome, PlaybackError> {
            while !cancel.load( Ordering::Relaxed ) {
                thread::sleep( Duration::from_millis( 1 ) );
            }
            Ok( PlaybackOutcome::Cancelled )
        }
    }


    #[test]
    fn test_finished_event() {
        let ( tx, rx ) = mpsc::channel();
        let task = PlaybackTask::spawn( 3, PathBuf::from( "a.mp3" ), Arc::new( Immediate( Ok( PlaybackOutcome::Completed ) ) ), tx ).unwrap();

        assert_eq!( rx.recv_timeout( WAIT ).unwrap(), PlaybackEvent::Finished { id: 3 } );
        assert_eq!( task.path(), Path::new( "a.mp3" ) );
    }


    #[test]
    fn test_failed_event_carries_message() {
        let ( tx, rx ) = mpsc::channel();
        let _task = PlaybackTask::spawn( 1, PathBuf::from( "a.mp3" ), Arc::new( Immediate( Err( "boom" ) ) ), tx ).unwrap();

        match rx.recv_timeout( WAIT ).unwrap() {
            PlaybackEvent::Failed { id, message } => {
                assert_eq!( id, 1 );
                assert!( message.contains( "boom" ) );
            }
            other => panic!( "unexpected event {:?}", other ),
        }
    }


    #[test]
    fn test_cancel_stops_thread() {
        let ( tx, rx ) = mpsc::channel();
        let task = PlaybackTask::spawn( 7, PathBuf::from( "a.mp3" ), Arc::new( UntilCancelled ), tx ).unwrap();

        assert!( rx.recv_timeout( Duration::from_millis( 50 ) ).is_err() );
        task.cancel();
        assert_eq!( rx.recv_timeout( WAIT ).unwrap(), PlaybackEvent::Cancelled { id: 7 } );
    }


    #[test]
    fn test_drop_cancels() {
        let ( tx, rx ) = mpsc::channel();
        let task = PlaybackTask::spawn( 2, PathBuf::from( "a.mp3" ), Arc::new( UntilCancelled ), tx ).unwrap();

        drop( task );
        assert_eq!( rx.recv_timeout( WAIT ).unwrap().id(), 2 );
    }


    #[test]
    fn test_system_audio_missing_file() {
        let cancel = AtomicBool::new( false );
        let result = SystemAudio.play( Path::new( "/definitely/not/here.mp3" ), &cancel );

        assert!( matches!( result, Err( PlaybackError::Decoder( DecoderError::FileOpen( _ ) ) ) ) );
    }


    #[test]
    fn test_system_audio_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "fake.mp3" );
        std::fs::write( &path, b"this is not an mp3 file at all" ).unwrap();

        let cancel = AtomicBool::new( false );
        let result = SystemAudio.play( &path, &cancel );

        assert!( matches!( result, Err( PlaybackError::Decoder( _ ) ) ) );
    }


    #[test]
    fn test_push_all_stops_when_stream_dies() {
        // Full buffer that nothing drains
        let buffer = Arc::new( SampleBuffer::new( 2, 2, 2 ) );
        buffer.push( &[ 0.0, 0.0 ] );

        let device = Arc::clone( &buffer );
        let unplug = thread::spawn( move || {
            thread::sleep( Duration::from_millis( 20 ) );
            device.fail( "device unplugged".to_string() );
        });

        let cancel = AtomicBool::new( false );
        let result = push_all( &buffer, &[ 1.0; 4 ], &cancel );
        unplug.join().unwrap();

        assert!( matches!( result, Err( OutputError::Stream( ref m ) ) if m == "device unplugged" ) );
    }


    #[test]
    fn test_drain_stops_when_stream_dies() {
        let buffer = SampleBuffer::new( 8, 2, 2 );
        buffer.push( &[ 0.1, 0.2, 0.3, 0.4 ] );
        buffer.fail( "device unplugged".to_string() );

        let cancel = AtomicBool::new( false );
        let error = PlaybackError::from( drain( &buffer, 2, &cancel ).unwrap_err() );
        assert_eq!( error.to_string(), "Audio stream failed: device unplugged" );
    }


    #[test]
    fn test_drain_returns_when_cancelled() {
        let buffer = SampleBuffer::new( 8, 2, 2 );
        buffer.push( &[ 0.1, 0.2 ] );

        let cancel = AtomicBool::new( true );
        assert!( drain( &buffer, 2, &cancel ).is_ok() );
        assert_eq!( buffer.len(), 2 );
    }


    #[test]
    fn test_interleave_round_trip() {
        let mut planar = vec![ Vec::new(), Vec::new() ];
        deinterleave_into( &[ 1.0, 2.0, 3.0, 4.0, 5.0 ], &mut planar );

        assert_eq!( planar, vec![ vec![ 1.0, 3.0 ], vec![ 2.0, 4.0 ] ] );
        assert_eq!( interleave( &planar ), vec![ 1.0, 2.0, 3.0, 4.0 ] );
    }
}
