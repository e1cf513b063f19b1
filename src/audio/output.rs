//! Real audio output using CPAL (Cross-Platform Audio Library).

use crate::audio::graph::{OutputDevice, Renderer};
use crate::error::{Result, VoxError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, warn};

/// Keeps fd 2 pointed at /dev/null while alive, so ALSA and JACK probing
/// noise never reaches the terminal. Restores the saved stderr on drop.
///
/// Must not overlap with another thread redirecting fd 2.
struct MutedStderr {
    saved: libc::c_int,
}

impl MutedStderr {
    fn new() -> Self {
        // SAFETY: plain fd duplication; the saved descriptor is restored on drop.
        unsafe {
            let saved = libc::dup(2);
            let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
            if saved >= 0 && devnull >= 0 {
                libc::dup2(devnull, 2);
            }
            if devnull >= 0 {
                libc::close(devnull);
            }
            Self { saved }
        }
    }
}

impl Drop for MutedStderr {
    fn drop(&mut self) {
        if self.saved >= 0 {
            // SAFETY: `saved` is a descriptor this guard owns.
            unsafe {
                libc::dup2(self.saved, 2);
                libc::close(self.saved);
            }
        }
    }
}

/// Asks JACK and PipeWire not to start servers or log while cpal probes
/// them. Call once at startup.
pub fn quiet_audio_backends() {
    // SAFETY: called before any audio thread exists.
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// How an output device is presented when choosing where announcements play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceKind {
    /// A sound server that mixes with other applications.
    Server,
    /// A plain hardware or plugin device.
    Direct,
    /// A single-speaker ALSA channel map, never offered.
    ChannelMap,
}

fn classify(name: &str) -> DeviceKind {
    let lower = name.to_lowercase();
    if ["surround", "front:", "rear:", "center:", "side:"]
        .iter()
        .any(|prefix| lower.contains(prefix))
    {
        DeviceKind::ChannelMap
    } else if ["pipewire", "pulse"].iter().any(|server| lower.contains(server)) {
        DeviceKind::Server
    } else {
        DeviceKind::Direct
    }
}

/// Named output devices of the default host, probed with stderr muted.
fn output_devices() -> Result<Vec<(String, cpal::Device)>> {
    let _muted = MutedStderr::new();
    let devices = cpal::default_host()
        .output_devices()
        .map_err(|e| VoxError::AudioOutput {
            message: format!("Failed to enumerate output devices: {}", e),
        })?;
    Ok(devices
        .filter_map(|device| device.name().ok().map(|name| (name, device)))
        .collect())
}

/// Lists output devices worth announcing on. Sound servers are marked
/// "\[recommended\]".
///
/// # Errors
/// Returns `VoxError::AudioOutput` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    Ok(output_devices()?
        .into_iter()
        .filter_map(|(name, _)| match classify(&name) {
            DeviceKind::ChannelMap => None,
            DeviceKind::Server => Some(format!("{} [recommended]", name)),
            DeviceKind::Direct => Some(name),
        })
        .collect())
}

/// Finds the device called `name`, or the first sound server falling back to
/// the host default.
fn find_device(name: Option<&str>) -> Result<cpal::Device> {
    let devices = output_devices()?;
    let found = match name {
        Some(name) => devices.into_iter().find(|(candidate, _)| candidate == name),
        None => devices
            .into_iter()
            .find(|(candidate, _)| classify(candidate) == DeviceKind::Server),
    };
    if let Some((_, device)) = found {
        return Ok(device);
    }
    if let Some(name) = name {
        return Err(VoxError::AudioDeviceNotFound {
            device: name.to_string(),
        });
    }

    let _muted = MutedStderr::new();
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| VoxError::AudioDeviceNotFound {
            device: "default".to_string(),
        })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is owned by `CpalOutput`, which is only ever reached
/// through the `Mutex` inside `AudioContext`, so it is never touched from two
/// threads at once.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Output device backed by a CPAL output stream.
///
/// Plays the graph's mono signal on every channel of the device's default
/// output configuration.
pub struct CpalOutput {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    stream: Option<SendableStream>,
    playing: bool,
}

impl CpalOutput {
    /// Opens an output device.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the best default output device.
    ///
    /// # Errors
    /// Returns errors if the device is not found or has no usable output config.
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let device = find_device(device_name)?;
        let config = device
            .default_output_config()
            .map_err(|e| VoxError::AudioOutput {
                message: format!("Failed to query default output config: {}", e),
            })?;

        debug!(
            channels = config.channels(),
            sample_rate = config.sample_rate().0,
            format = ?config.sample_format(),
            "opened output device"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            playing: false,
        })
    }

    fn build_stream(&self, renderer: Renderer) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let stream_config: cpal::StreamConfig = self.config.clone().into();
        let channels = stream_config.channels as usize;
        let err_callback = |err| {
            error!("audio output stream error: {}", err);
        };

        match self.config.sample_format() {
            SampleFormat::F32 => self
                .device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        renderer.render(data, channels);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| VoxError::AudioOutput {
                    message: format!("Failed to build f32 output stream: {}", e),
                }),
            SampleFormat::I16 => {
                let mut scratch: Vec<f32> = Vec::new();
                self.device
                    .build_output_stream(
                        &stream_config,
                        move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                            scratch.resize(data.len(), 0.0);
                            renderer.render(&mut scratch, channels);
                            for (out, &s) in data.iter_mut().zip(scratch.iter()) {
                                *out = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                            }
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| VoxError::AudioOutput {
                        message: format!("Failed to build i16 output stream: {}", e),
                    })
            }
            fmt => Err(VoxError::AudioOutput {
                message: format!(
                    "Unsupported output sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }
}

impl OutputDevice for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    fn attach(&mut self, renderer: Renderer) -> Result<()> {
        let stream = self.build_stream(renderer)?;
        // Some hosts start streams on creation.
        if let Err(e) = stream.pause() {
            warn!("could not pause new output stream: {}", e);
        }
        self.stream = Some(SendableStream(stream));
        self.playing = false;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        !self.playing
    }

    fn resume(&mut self) -> Result<()> {
        let stream = self.stream.as_ref().ok_or_else(|| VoxError::AudioOutput {
            message: "output stream not attached".to_string(),
        })?;
        stream.0.play().map_err(|e| VoxError::AudioOutput {
            message: format!("Failed to start audio stream: {}", e),
        })?;
        self.playing = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_maps_are_hidden() {
        assert_eq!(classify("surround51:CARD=PCH"), DeviceKind::ChannelMap);
        assert_eq!(classify("front:CARD=PCH,DEV=0"), DeviceKind::ChannelMap);
        assert_eq!(classify("HDMI Output"), DeviceKind::Direct);
        assert_eq!(classify("hw:0,0"), DeviceKind::Direct);
    }

    #[test]
    fn test_sound_servers_are_preferred() {
        assert_eq!(classify("pipewire"), DeviceKind::Server);
        assert_eq!(classify("PulseAudio"), DeviceKind::Server);
        assert_eq!(classify("default"), DeviceKind::Direct);
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_open_default_output() {
        let output = CpalOutput::open(None).expect("no output device");
        assert!(output.sample_rate() > 0);
        assert!(output.is_suspended());
    }
}
