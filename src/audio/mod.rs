//! Audio container reading
//!
//! The only fact the reconciliation needs from a WAV is its duration. We let
//! symphonia probe the container and read the frame count from the stream
//! header; no samples are decoded.
//!
//! ```text
//! duration = n_frames / sample_rate
//! ```
//!
//! When the header carries no frame count (streamed or truncated files), the
//! packets are walked and their durations summed instead.

pub mod archive;

pub use archive::inventory_archive;

use crate::error::AudioError;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Anything longer than this is more likely a corrupt header than a real side
const SUSPICIOUS_DURATION_SECS: f64 = 7200.0;

/// Returns the duration in seconds of an in-memory audio file
pub trait DurationProbe: Send + Sync {
    fn duration_secs(&self, bytes: &[u8]) -> Result<f64, AudioError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProbe;

impl DurationProbe for SymphoniaProbe {
    fn duration_secs(&self, bytes: &[u8]) -> Result<f64, AudioError> {
        let cursor = std::io::Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("wav");

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let (track_id, sample_rate, n_frames) = {
            let track = format.default_track().ok_or(AudioError::NoTrack)?;
            (
                track.id,
                track.codec_params.sample_rate.unwrap_or(0),
                track.codec_params.n_frames,
            )
        };

        if sample_rate == 0 {
            return Ok(0.0);
        }

        let frames = match n_frames {
            Some(n) => n,
            None => {
                let mut total: u64 = 0;
                loop {
                    match format.next_packet() {
                        Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                        Ok(_) => continue,
                        Err(SymphoniaError::IoError(ref e))
                            if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                        {
                            break
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                total
            }
        };

        let duration = frames as f64 / f64::from(sample_rate);
        if duration > SUSPICIOUS_DURATION_SECS {
            log::warn!(
                "WAV duration {:.1}s seems unusually long, possibly corrupted",
                duration
            );
        }
        Ok(duration)
    }
}
