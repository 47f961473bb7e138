//! Seam for the external tempo-change engine.
//!
//! The DSP itself lives outside this crate. What lives here is the message
//! shape and the rule that a failed stretch is a soft failure: playback goes
//! on with the unprocessed audio.

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct StretchRequest<K> {
    /// One buffer per channel, all the same length.
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
    /// `> 1` speeds up, `< 1` slows down.
    pub rate_factor: f32,
    pub cache_key: K,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StretchResponse<K> {
    /// `None` when the backend could not process the request.
    pub processed_channels: Option<Vec<Vec<f32>>>,
    pub sample_rate: u32,
    pub cache_key: K,
}

pub trait TimeStretch {
    fn stretch<K>(&mut self, request: StretchRequest<K>) -> StretchResponse<K>;
}

impl<K> StretchRequest<K> {
    /// True when the request can be handed to a backend at all.
    pub fn is_well_formed(&self) -> bool {
        let Some(first) = self.channels.first() else {
            return false;
        };
        !first.is_empty()
            && self.channels.iter().all(|c| c.len() == first.len())
            && self.rate_factor.is_finite()
            && self.rate_factor > 0.0
            && self.sample_rate > 0
    }
}

/// Audio ready to play after a stretch attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchOutcome<K> {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub cache_key: K,
    /// False when the original channels were passed through.
    pub stretched: bool,
}

/// Runs `request` through `backend`, falling back to the input channels on
/// any failure. Malformed requests never reach the backend.
pub fn stretch_or_passthrough<B, K>(backend: &mut B, request: StretchRequest<K>) -> StretchOutcome<K>
where
    B: TimeStretch,
{
    if !request.is_well_formed() {
        warn!(
            channels = request.channels.len(),
            rate = request.rate_factor,
            "skipping stretch for malformed request"
        );
        return StretchOutcome {
            channels: request.channels,
            sample_rate: request.sample_rate,
            cache_key: request.cache_key,
            stretched: false,
        };
    }

    let original = request.channels.clone();
    let sample_rate = request.sample_rate;
    let response = backend.stretch(request);
    match response.processed_channels {
        Some(channels) => StretchOutcome {
            channels,
            sample_rate: response.sample_rate,
            cache_key: response.cache_key,
            stretched: true,
        },
        None => {
            warn!("time-stretch backend failed, playing unprocessed audio");
            StretchOutcome {
                channels: original,
                sample_rate,
                cache_key: response.cache_key,
                stretched: false,
            }
        }
    }
}
