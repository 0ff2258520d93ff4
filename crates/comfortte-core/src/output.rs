//! Audio output via cpal
//!
//! Hands decoded PCM to the default output device through a bounded
//! buffer that the device callback drains.

use std::collections::VecDeque;
use std::sync::{ Arc, Mutex, MutexGuard };

use cpal::traits::{ DeviceTrait, HostTrait, StreamTrait };
use thiserror::Error;


/// Errors that can occur with audio output.
#[derive( Debug, Error )]
pub enum OutputError {
    #[error( "No output device available" )]
    NoDevice,

    #[error( "Failed to get stream config: {0}" )]
    StreamConfig( String ),

    #[error( "Failed to build output stream: {0}" )]
    BuildStream( String ),

    #[error( "Failed to play stream: {0}" )]
    PlayStream( String ),

    #[error( "Audio stream failed: {0}" )]
    Stream( String ),
}


/// Bounded sample queue between the decode thread and the device callback.
///
/// Samples are stored in the source channel layout and converted to the
/// device layout on the way out. A stream error raised by the device is
/// parked here so the producer stops waiting for a drain that never comes.
pub struct SampleBuffer {
    buffer: Mutex<VecDeque<f32>>,
    failure: Mutex<Option<String>>,
    capacity: usize,
    source_channels: usize,
    output_channels: usize,
}


impl SampleBuffer {
    /// Creates a buffer holding at most `capacity` source samples.
    pub fn new( capacity: usize, source_channels: u16, output_channels: u16 ) -> Self {
        Self {
            buffer: Mutex::new( VecDeque::with_capacity( capacity ) ),
            failure: Mutex::new( None ),
            capacity,
            source_channels: source_channels.max( 1 ) as usize,
            output_channels: output_channels.max( 1 ) as usize,
        }
    }


    fn lock( &self ) -> MutexGuard<'_, VecDeque<f32>> {
        // The callback must keep running even if a producer panicked mid-push
        self.buffer.lock().unwrap_or_else( |poisoned| poisoned.into_inner() )
    }


    /// Pushes as many samples as fit. Returns the number accepted.
    pub fn push( &self, samples: &[f32] ) -> usize {
        let mut buf = self.lock();
        let to_push = samples.len().min( self.capacity.saturating_sub( buf.len() ) );
        buf.extend( samples[ ..to_push ].iter().copied() );
        to_push
    }


    /// Fills `output` (device layout) from the queue, padding with silence.
    ///
    /// Returns the number of output samples that carry audio.
    pub fn pop( &self, output: &mut [f32] ) -> usize {
        let mut buf = self.lock();
        let src_ch = self.source_channels;
        let out_ch = self.output_channels;

        let frames = ( output.len() / out_ch ).min( buf.len() / src_ch );
        let mut frame = vec![ 0.0; src_ch ];

        for f in 0..frames {
            for sample in frame.iter_mut() {
                *sample = buf.pop_front().unwrap_or( 0.0 );
            }
            remix( &frame, &mut output[ f * out_ch..( f + 1 ) * out_ch ] );
        }

        let written = frames * out_ch;
        output[ written.. ].fill( 0.0 );
        written
    }


    /// Returns the number of samples currently queued.
    pub fn len( &self ) -> usize {
        self.lock().len()
    }


    /// Returns true if nothing is queued.
    pub fn is_empty( &self ) -> bool {
        self.lock().is_empty()
    }


    /// Drops everything queued.
    pub fn clear( &self ) {
        self.lock().clear();
    }


    /// Records a device error. The first one wins.
    pub fn fail( &self, message: String ) {
        let mut failure = self.failure.lock().unwrap_or_else( |poisoned| poisoned.into_inner() );
        failure.get_or_insert( message );
    }


    /// Returns the device error, if the stream has died.
    pub fn check( &self ) -> Result<(), OutputError> {
        let failure = self.failure.lock().unwrap_or_else( |poisoned| poisoned.into_inner() );
        match failure.as_ref() {
            Some( message ) => Err( OutputError::Stream( message.clone() ) ),
            None => Ok(()),
        }
    }
}


/// Maps one source frame onto one output frame.
///
/// Stereo to mono averages; otherwise channels are copied by position and
/// surplus output channels repeat the last source channel.
fn remix( input: &[f32], output: &mut [f32] ) {
    match ( input.len(), output.len() ) {
        ( 2, 1 ) => output[ 0 ] = ( input[ 0 ] + input[ 1 ] ) * 0.5,
        ( src, _ ) => {
            for ( ch, sample ) in output.iter_mut().enumerate() {
                *sample = input[ ch.min( src - 1 ) ];
            }
        }
    }
}


/// Open output stream on the default device.
///
/// Not Send: cpal streams must stay on the thread that built them.
pub struct AudioOutput {
    stream: cpal::Stream,
    sample_rate: u32,
}


impl AudioOutput {
    /// Opens the default device, preferring a config at the source sample rate.
    ///
    /// Returns the output and the buffer to feed it. When the device cannot
    /// run at `source_sample_rate`, the returned `sample_rate()` differs and
    /// the caller must resample.
    pub fn new(
        source_sample_rate: u32,
        source_channels: u16,
    ) -> Result<( Self, Arc<SampleBuffer> ), OutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or( OutputError::NoDevice )?;

        tracing::info!( "Using output device: {:?}", device.name() );

        let supported: Vec<_> = device
            .supported_output_configs()
            .map_err( |e| OutputError::StreamConfig( e.to_string() ) )?
            .filter( |c| c.sample_format() == cpal::SampleFormat::F32 )
            .collect();

        let rate_fits = |c: &cpal::SupportedStreamConfigRange| {
            c.min_sample_rate().0 <= source_sample_rate && c.max_sample_rate().0 >= source_sample_rate
        };

        let config = match supported.iter()
            .find( |c| c.channels() == source_channels && rate_fits( c ) )
            .or_else( || supported.iter().find( |c| rate_fits( c ) ) )
        {
            Some( range ) => range.clone()
                .with_sample_rate( cpal::SampleRate( source_sample_rate ) )
                .config(),
            None => {
                let default_config = device
                    .default_output_config()
                    .map_err( |e| OutputError::StreamConfig( e.to_string() ) )?;
                tracing::info!(
                    "Device cannot run at {} Hz, using {} Hz",
                    source_sample_rate,
                    default_config.sample_rate().0
                );
                default_config.config()
            }
        };

        tracing::debug!( "Audio output config: {} Hz, {} channels", config.sample_rate.0, config.channels );

        // About half a second of audio at the device rate
        let capacity = ( config.sample_rate.0 as usize ) * ( source_channels.max( 1 ) as usize ) / 2;
        let buffer = Arc::new( SampleBuffer::new( capacity, source_channels, config.channels ) );
        let callback_buffer = Arc::clone( &buffer );
        let error_buffer = Arc::clone( &buffer );

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback_buffer.pop( data );
                },
                move |err| {
                    tracing::error!( "Audio output error: {}", err );
                    error_buffer.fail( err.to_string() );
                },
                None,
            )
            .map_err( |e| OutputError::BuildStream( e.to_string() ) )?;

        Ok((
            Self {
                stream,
                sample_rate: config.sample_rate.0,
            },
            buffer,
        ))
    }


    /// Starts the stream.
    pub fn play( &self ) -> Result<(), OutputError> {
        self.stream
            .play()
            .map_err( |e| OutputError::PlayStream( e.to_string() ) )
    }


    /// Gets the device sample rate.
    pub fn sample_rate( &self ) -> u32 {
        self.sample_rate
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_push_respects_capacity() {
        let buffer = SampleBuffer::new( 4, 2, 2 );
        assert_eq!( buffer.push( &[ 0.1, 0.2, 0.3 ] ), 3 );
        assert_eq!( buffer.push( &[ 0.4, 0.5, 0.6 ] ), 1 );
        assert_eq!( buffer.len(), 4 );
    }


    #[test]
    fn test_pop_pads_with_silence() {
        let buffer = SampleBuffer::new( 16, 2, 2 );
        buffer.push( &[ 0.5, -0.5 ] );

        let mut out = [ 1.0; 6 ];
        assert_eq!( buffer.pop( &mut out ), 2 );
        assert_eq!( out, [ 0.5, -0.5, 0.0, 0.0, 0.0, 0.0 ] );
        assert!( buffer.is_empty() );
    }


    #[test]
    fn test_mono_to_stereo() {
        let buffer = SampleBuffer::new( 16, 1, 2 );
        buffer.push( &[ 0.25, 0.75 ] );

        let mut out = [ 0.0; 4 ];
        assert_eq!( buffer.pop( &mut out ), 4 );
        assert_eq!( out, [ 0.25, 0.25, 0.75, 0.75 ] );
    }


    #[test]
    fn test_stereo_to_mono_averages() {
        let buffer = SampleBuffer::new( 16, 2, 1 );
        buffer.push( &[ 1.0, 0.0, 0.5, 0.5 ] );

        let mut out = [ 0.0; 2 ];
        assert_eq!( buffer.pop( &mut out ), 2 );
        assert_eq!( out, [ 0.5, 0.5 ] );
    }


    #[test]
    fn test_partial_frame_stays_queued() {
        let buffer = SampleBuffer::new( 16, 2, 2 );
        buffer.push( &[ 0.1, 0.2, 0.3 ] );

        let mut out = [ 0.0; 4 ];
        assert_eq!( buffer.pop( &mut out ), 2 );
        assert_eq!( buffer.len(), 1 );

        buffer.clear();
        assert!( buffer.is_empty() );
    }


    #[test]
    fn test_first_stream_failure_is_kept() {
        let buffer = SampleBuffer::new( 16, 2, 2 );
        assert!( buffer.check().is_ok() );

        buffer.fail( "device unplugged".to_string() );
        buffer.fail( "later noise".to_string() );

        match buffer.check() {
            Err( OutputError::Stream( message ) ) => assert_eq!( message, "device unplugged" ),
            other => panic!( "unexpected {:?}", other ),
        }
    }
}
