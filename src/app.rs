//! Composition root: wires configuration, the resolver, the engine and an
//! output device together for the CLI commands.

use crate::audio::graph::AudioContext;
use crate::audio::wav::{Recording, WavRecorder};
use crate::cli::{PhraseArgs, SpeechArgs};
use crate::config::Config;
use crate::phrase::{AnnouncementState, PhraseNode, load_phrase, to_vox};
use crate::vox::decode::SymphoniaDecoder;
use crate::vox::engine::VoxEngine;
use crate::vox::fetch::AutoFetcher;
use crate::vox::key::{VoxKey, format_keys};
use crate::vox::settings::VoxSettings;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

/// Applies command-line overrides on top of the configured settings.
pub fn speech_settings(config: &Config, args: &SpeechArgs) -> VoxSettings {
    let mut settings = config.vox.clone();
    if let Some(path) = &args.vox_path {
        settings.path = path.clone();
    }
    if let Some(reverb) = &args.reverb {
        settings.reverb = reverb.clone();
    }
    if let Some(chime) = &args.chime {
        settings.chime = chime.clone();
    }
    if let Some(volume) = args.volume {
        settings.volume = volume;
    }
    if let Some(rate) = args.rate {
        settings.rate = rate;
    }
    settings
}

/// Loads the phrase tree and its slot state.
pub fn load_announcement(args: &PhraseArgs) -> Result<(PhraseNode, AnnouncementState)> {
    let phrase = load_phrase(&args.phrase)
        .with_context(|| format!("Failed to load phrase from {}", args.phrase.display()))?;
    let state = match &args.state {
        Some(path) => AnnouncementState::load(path)
            .with_context(|| format!("Failed to load state from {}", path.display()))?,
        None => AnnouncementState::default(),
    };
    Ok((phrase, state))
}

/// Resolves a phrase file to keys.
pub fn resolve_announcement(args: &PhraseArgs) -> Result<Vec<VoxKey>> {
    let (phrase, state) = load_announcement(args)?;
    Ok(to_vox(&phrase, &state))
}

/// `railvox resolve`: prints the keys for a phrase.
pub fn run_resolve_command(args: &PhraseArgs, json: bool) -> Result<()> {
    let keys = resolve_announcement(args)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
    } else {
        println!("{}", format_keys(&keys));
    }
    Ok(())
}

/// `railvox speak`: resolves a phrase and speaks it.
pub async fn run_speak_command(
    config: &Config,
    phrase: &PhraseArgs,
    speech: &SpeechArgs,
    quiet: bool,
) -> Result<()> {
    let keys = resolve_announcement(phrase)?;
    run_say_command(config, keys, speech, quiet).await
}

/// `railvox say`: speaks a key list.
pub async fn run_say_command(
    config: &Config,
    keys: Vec<VoxKey>,
    speech: &SpeechArgs,
    quiet: bool,
) -> Result<()> {
    let settings = speech_settings(config, speech);

    match &speech.output {
        Some(path) => {
            let (recorder, recording) = WavRecorder::new(config.audio.record_sample_rate);
            let context = AudioContext::new(Box::new(recorder))?;
            let engine = engine_for(context);
            speak_to_end(&engine, &keys, &settings, quiet).await?;
            save_recording(&recording, path, quiet)
        }
        None => {
            let device = speech.device.as_deref().or(config.audio.device.as_deref());
            let engine = open_output(device)?;
            speak_to_end(&engine, &keys, &settings, quiet).await
        }
    }
}

fn engine_for(context: AudioContext) -> VoxEngine {
    VoxEngine::new(
        context,
        Arc::new(AutoFetcher::new()),
        Arc::new(SymphoniaDecoder),
    )
}

#[cfg(feature = "cpal-audio")]
fn open_output(device: Option<&str>) -> Result<VoxEngine> {
    crate::audio::output::quiet_audio_backends();
    VoxEngine::with_output_device(device).context("Failed to open audio output")
}

#[cfg(not(feature = "cpal-audio"))]
fn open_output(_device: Option<&str>) -> Result<VoxEngine> {
    anyhow::bail!("built without audio output support; use --output to record to a file")
}

/// Speaks `keys` and waits until the session ends or Ctrl+C is pressed.
pub async fn speak_to_end(
    engine: &VoxEngine,
    keys: &[VoxKey],
    settings: &VoxSettings,
    quiet: bool,
) -> Result<()> {
    let finished = Arc::new(Notify::new());
    let notify = Arc::clone(&finished);
    engine.set_onstop(move || notify.notify_one());

    if !quiet {
        eprintln!("{} {}", "Speaking:".dimmed(), format_keys(keys));
    }
    engine.speak(keys, settings);

    tokio::select! {
        _ = finished.notified() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("interrupted");
            engine.stop();
        }
    }
    engine.clear_onstop();
    Ok(())
}

fn save_recording(recording: &Recording, path: &Path, quiet: bool) -> Result<()> {
    recording
        .write_wav(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    if !quiet {
        let seconds = recording.samples().len() as f64 / recording.sample_rate() as f64;
        println!(
            "{} {} ({:.1}s)",
            "Saved".green(),
            path.display(),
            seconds
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_speech_settings_overrides() {
        let config = Config::default();
        let args = SpeechArgs {
            vox_path: Some("/srv/vox".to_string()),
            reverb: Some(String::new()),
            rate: Some(1.2),
            ..Default::default()
        };
        let settings = speech_settings(&config, &args);
        assert_eq!(settings.path, "/srv/vox");
        assert_eq!(settings.reverb, "");
        assert_eq!(settings.rate, 1.2);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn test_speech_settings_without_overrides_uses_config() {
        let mut config = Config::default();
        config.vox.chime = "chime.mp3".to_string();
        let settings = speech_settings(&config, &SpeechArgs::default());
        assert_eq!(settings, config.vox);
    }

    #[test]
    fn test_resolve_announcement_from_files() {
        let mut phrase = NamedTempFile::new().unwrap();
        phrase
            .write_all(
                br#"{ "type": "phrase", "attrs": { "ref": "p" },
                      "children": [{ "type": "station", "attrs": { "context": "source" } }, "."] }"#,
            )
            .unwrap();
        let mut state = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        state.write_all(b"[stations]\nsource = \"CRE\"\n").unwrap();

        let args = PhraseArgs {
            phrase: phrase.path().to_path_buf(),
            state: Some(state.path().to_path_buf()),
        };
        let keys = resolve_announcement(&args).unwrap();
        assert_eq!(keys, crate::vox![0.2, "station.CRE.end", 0.65]);
    }

    #[test]
    fn test_resolve_announcement_missing_phrase() {
        let args = PhraseArgs {
            phrase: PathBuf::from("/nonexistent/railvox/phrase.json"),
            state: None,
        };
        let err = resolve_announcement(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to load phrase"));
    }
}
