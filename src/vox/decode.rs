//! Decoding fetched clip bytes into PCM.

use crate::audio::buffer::AudioBuffer;
use crate::error::{Result, VoxError};
use std::io::Cursor;
use std::sync::Arc;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Trait for turning encoded audio into a mono [`AudioBuffer`].
pub trait ClipDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer>;
}

impl<T: ClipDecoder + ?Sized> ClipDecoder for Arc<T> {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer> {
        (**self).decode(bytes)
    }
}

fn decode_err(message: impl Into<String>) -> VoxError {
    VoxError::Decode {
        message: message.into(),
    }
}

fn mix_down<T>(
    samples: &mut Vec<f32>,
    data: std::borrow::Cow<symphonia::core::audio::AudioBuffer<T>>,
) where
    T: symphonia::core::sample::Sample,
    f32: FromSample<T>,
{
    let channels = data.spec().channels.count().max(1);
    let frames = data.frames();
    for frame in 0..frames {
        let sum: f32 = (0..channels)
            .map(|ch| f32::from_sample(data.chan(ch)[frame]))
            .sum();
        samples.push(sum / channels as f32);
    }
}

/// Decoder for MP3 and WAV using symphonia.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl ClipDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer> {
        let source = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_err(format!("unrecognised format: {}", e)))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| decode_err("no supported audio tracks"))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_err(format!("unsupported codec: {}", e)))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

        let mut pcm = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(decode_err(e.to_string())),
            };

            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A corrupt frame is skipped, like a browser would.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(decode_err(e.to_string())),
            };

            if sample_rate == 0 {
                sample_rate = decoded.spec().rate;
            }

            match decoded {
                AudioBufferRef::F32(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::U8(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::U16(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::U24(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::U32(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::S8(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::S16(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::S24(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::S32(buf) => mix_down(&mut pcm, buf),
                AudioBufferRef::F64(buf) => mix_down(&mut pcm, buf),
            }
        }

        if pcm.is_empty() || sample_rate == 0 {
            return Err(decode_err("no audio decoded"));
        }
        Ok(AudioBuffer::new(pcm, sample_rate))
    }
}

/// Mock decoder for testing: every input byte becomes one silent frame.
#[derive(Debug, Clone)]
pub struct MockDecoder {
    sample_rate: u32,
}

impl MockDecoder {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl ClipDecoder for MockDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer> {
        if bytes.is_empty() {
            return Err(decode_err("empty input"));
        }
        Ok(AudioBuffer::new(vec![0.0; bytes.len()], self.sample_rate))
    }
}
