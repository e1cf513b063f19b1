//! The speech engine: turns a list of vox keys into a gapless sequence of
//! scheduled clips.
//!
//! A session runs on a pump tick. Each tick schedules every settled request
//! at the head of the queue, refills the queue from the remaining keys and
//! checks whether the session is exhausted. Requests are fetched concurrently
//! but always scheduled in key order.

use crate::audio::buffer::AudioBuffer;
use crate::audio::graph::{AudioContext, VoiceId};
use crate::audio::reverb::Convolver;
use crate::defaults;
use crate::vox::decode::ClipDecoder;
use crate::vox::fetch::ClipFetcher;
use crate::vox::key::VoxKey;
use crate::vox::request::{ClipLoader, VoxRequest};
use crate::vox::settings::{VoxSettings, remap_rate};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Callback invoked whenever a session ends, naturally or by [`VoxEngine::stop`].
pub type StopCallback = Arc<dyn Fn() + Send + Sync>;

/// Snapshot of the engine's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    pub speaking: bool,
    /// Keys not yet turned into requests.
    pub remaining_keys: usize,
    /// Requests fetched or in flight, not yet scheduled.
    pub pending: usize,
    /// Clips scheduled that have not finished playing.
    pub live: usize,
    /// Where the next clip will be scheduled, once anything has been.
    pub next_start: Option<f64>,
}

struct Session {
    id: u64,
    keys: VecDeque<VoxKey>,
    settings: VoxSettings,
    pending: VecDeque<VoxRequest>,
    live: Vec<VoiceId>,
    next_start: Option<f64>,
    pump: Option<JoinHandle<()>>,
}

impl Session {
    fn new(id: u64, keys: &[VoxKey], settings: VoxSettings) -> Self {
        Self {
            id,
            keys: keys.iter().cloned().collect(),
            settings,
            pending: VecDeque::new(),
            live: Vec::new(),
            next_start: None,
            pump: None,
        }
    }

    /// Moves settled requests from the head of the queue onto the timeline.
    fn schedule(&mut self, context: &AudioContext) {
        while self.live.len() < defaults::MAX_LIVE_CLIPS {
            let Some(head) = self.pending.front_mut() else {
                break;
            };
            if !head.is_done() {
                break;
            }
            let Some(request) = self.pending.pop_front() else {
                break;
            };
            let Some(buffer) = request.buffer().cloned() else {
                debug!(path = request.path(), "vox clip skipped");
                continue;
            };

            let begin = *self
                .next_start
                .get_or_insert_with(|| context.current_time());
            let latency = context.base_latency().unwrap_or(defaults::BASE_LATENCY)
                + defaults::LATENCY_COMPENSATION;
            let rate = remap_rate(
                request
                    .forced_rate()
                    .unwrap_or_else(|| self.settings.effective_rate()),
            );
            let delay = request.delay() / rate;
            let duration = buffer.duration() / rate;

            let voice = context.start_voice(buffer, rate, begin + delay);
            self.live.push(voice);
            self.next_start = Some(begin + (duration + delay - latency).max(0.0));
            debug!(
                path = request.path(),
                start = begin + delay,
                rate,
                duration,
                "vox clip scheduled"
            );
        }
    }

    /// Turns keys into requests until the queue is full, folding silences
    /// into the delay of the next clip.
    fn fill(&mut self, loader: &ClipLoader) {
        let mut delay = 0.0;
        while self.pending.len() < defaults::MAX_PENDING_REQUESTS {
            let Some(key) = self.keys.pop_front() else {
                break;
            };
            match key {
                VoxKey::Silence(seconds) => delay += seconds,
                VoxKey::Clip(id) => {
                    let path = self.settings.clip_path(&id);
                    self.pending
                        .push_back(VoxRequest::spawn(path, delay, loader));
                    delay = 0.0;
                }
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.keys.is_empty() && self.pending.is_empty() && self.live.is_empty()
    }

    fn teardown(&mut self, context: &AudioContext) {
        for request in self.pending.drain(..) {
            request.cancel();
        }
        for voice in self.live.drain(..) {
            context.stop_voice(voice);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

#[derive(Default)]
struct EngineState {
    session: Option<Session>,
    last_session: u64,
    impulses: HashMap<String, Arc<AudioBuffer>>,
    /// Impulse files being loaded. Loads outlive the session that started them.
    loading: HashSet<String>,
    onstop: Option<StopCallback>,
}

struct Inner {
    context: AudioContext,
    loader: ClipLoader,
    state: Mutex<EngineState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One pump tick. Returns false once session `id` is no longer running.
    fn pump(&self, id: u64) -> bool {
        let exhausted = {
            let mut state = self.state();
            let Some(session) = state.session.as_mut().filter(|s| s.id == id) else {
                return false;
            };

            for ended in self.context.drain_ended() {
                session.live.retain(|voice| *voice != ended);
            }
            session.schedule(&self.context);
            session.fill(&self.loader);
            session.is_exhausted()
        };

        if exhausted {
            debug!(session = id, "vox session exhausted");
            self.end_session(Some(id));
            return false;
        }
        true
    }

    /// Tears down the current session, or only session `id` when given, and
    /// reports the stop. Does nothing when no matching session is running.
    fn end_session(&self, id: Option<u64>) {
        let callback = {
            let mut state = self.state();
            let matches = state
                .session
                .as_ref()
                .is_some_and(|s| id.is_none_or(|id| s.id == id));
            if !matches {
                return;
            }
            let Some(mut session) = state.session.take() else {
                return;
            };
            session.teardown(&self.context);
            info!(session = session.id, "vox stopped");
            state.onstop.clone()
        };

        if let Some(callback) = callback {
            callback();
        }
    }
}

fn spawn_pump(inner: Weak<Inner>, id: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(defaults::PUMP_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else {
                break;
            };
            if !inner.pump(id) {
                break;
            }
        }
    })
}

/// Speaks vox key lists through an [`AudioContext`].
///
/// Cloning is cheap; clones drive the same engine. All methods must be called
/// from within a tokio runtime.
#[derive(Clone)]
pub struct VoxEngine {
    inner: Arc<Inner>,
}

impl VoxEngine {
    pub fn new(
        context: AudioContext,
        fetcher: Arc<dyn ClipFetcher>,
        decoder: Arc<dyn ClipDecoder>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                context,
                loader: ClipLoader::new(fetcher, decoder),
                state: Mutex::new(EngineState::default()),
            }),
        }
    }

    /// Engine on a cpal output device, fetching over HTTP or from disk.
    ///
    /// # Errors
    /// Fails when the device cannot be opened or its stream cannot be built.
    #[cfg(feature = "cpal-audio")]
    pub fn with_output_device(device: Option<&str>) -> crate::error::Result<Self> {
        let output = crate::audio::output::CpalOutput::open(device)?;
        let context = AudioContext::new(Box::new(output))?;
        Ok(Self::new(
            context,
            Arc::new(crate::vox::fetch::AutoFetcher::new()),
            Arc::new(crate::vox::decode::SymphoniaDecoder),
        ))
    }

    pub fn context(&self) -> &AudioContext {
        &self.inner.context
    }

    /// Speaks `keys`, replacing whatever is currently being spoken.
    ///
    /// A running session is stopped first, which reports its stop.
    pub fn speak(&self, keys: &[VoxKey], settings: &VoxSettings) {
        self.stop();

        let inner = &self.inner;
        let mut state = inner.state();
        state.last_session += 1;
        let id = state.last_session;
        let mut session = Session::new(id, keys, settings.clone());
        info!(
            session = id,
            keys = keys.len(),
            reverb = %settings.reverb,
            chime = %settings.chime,
            "vox speak"
        );

        self.configure_reverb(&mut state, settings);
        inner.context.set_gain(settings.gain());

        if !settings.chime.is_empty() {
            let path = settings.asset_path(&settings.chime);
            session.pending.push_back(
                VoxRequest::spawn(path, 0.0, &inner.loader)
                    .with_forced_rate(defaults::CHIME_RATE),
            );
            session.keys.push_front(VoxKey::Silence(defaults::CHIME_GAP));
        }

        let resumed = if inner.context.is_suspended() {
            inner.context.resume()
        } else {
            Ok(())
        };
        let failed = match resumed {
            Ok(()) => {
                session.pump = Some(spawn_pump(Arc::downgrade(inner), id));
                false
            }
            Err(e) => {
                warn!("cannot resume audio output: {}", e);
                true
            }
        };
        state.session = Some(session);
        drop(state);

        if failed {
            inner.end_session(Some(id));
        }
    }

    /// Applies the reverb for `settings`, loading its impulse if it is not
    /// cached. Reverb stays off until the impulse is ready.
    fn configure_reverb(&self, state: &mut EngineState, settings: &VoxSettings) {
        let context = &self.inner.context;
        if settings.reverb.is_empty() {
            context.set_reverb(None);
            return;
        }

        if let Some(impulse) = state.impulses.get(&settings.reverb) {
            context.set_reverb(Some(Convolver::from_impulse(
                impulse,
                context.sample_rate(),
                defaults::REVERB_BLOCK_SIZE,
            )));
            return;
        }

        context.set_reverb(None);
        if !state.loading.insert(settings.reverb.clone()) {
            debug!(file = %settings.reverb, "reverb impulse already loading");
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let loader = self.inner.loader.clone();
        let file = settings.reverb.clone();
        let path = settings.asset_path(&file);

        tokio::spawn(async move {
            let loaded = loader.load(&path).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut state = inner.state();
            state.loading.remove(&file);
            let impulse = match loaded {
                Ok(impulse) => Arc::new(impulse),
                Err(e) => {
                    warn!(path = %path, "reverb impulse unavailable: {}", e);
                    return;
                }
            };
            let convolver = Convolver::from_impulse(
                &impulse,
                inner.context.sample_rate(),
                defaults::REVERB_BLOCK_SIZE,
            );

            state.impulses.insert(file.clone(), impulse);
            let wanted = state
                .session
                .as_ref()
                .is_some_and(|s| s.settings.reverb == file);
            if wanted {
                inner.context.set_reverb(Some(convolver));
                debug!(file = %file, "reverb enabled");
            }
        });
    }

    /// Stops speaking: cancels requests, silences scheduled clips and reports
    /// the stop. Does nothing when idle.
    pub fn stop(&self) {
        self.inner.end_session(None);
    }

    /// Registers the callback run whenever a session ends.
    pub fn set_onstop<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.state().onstop = Some(Arc::new(callback));
    }

    pub fn clear_onstop(&self) {
        self.inner.state().onstop = None;
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.state().session.is_some()
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.inner.state();
        match &state.session {
            Some(session) => EngineStatus {
                speaking: true,
                remaining_keys: session.keys.len(),
                pending: session.pending.len(),
                live: session.live.len(),
                next_start: session.next_start,
            },
            None => EngineStatus {
                speaking: false,
                remaining_keys: 0,
                pending: 0,
                live: 0,
                next_start: None,
            },
        }
    }

    /// Whether an impulse for `file` has been loaded.
    pub fn has_impulse(&self, file: &str) -> bool {
        self.inner.state().impulses.contains_key(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::ManualOutput;
    use crate::vox::decode::MockDecoder;
    use crate::vox::fetch::MockFetcher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RATE: u32 = 1000;

    fn engine_with(fetcher: &MockFetcher, output: ManualOutput) -> VoxEngine {
        let context = AudioContext::new(Box::new(output)).unwrap();
        VoxEngine::new(
            context,
            Arc::new(fetcher.clone()),
            Arc::new(MockDecoder::new(RATE)),
        )
    }

    fn engine(fetcher: &MockFetcher) -> VoxEngine {
        engine_with(fetcher, ManualOutput::new(RATE).with_base_latency(0.01))
    }

    fn settings() -> VoxSettings {
        VoxSettings {
            path: "vox".to_string(),
            ..Default::default()
        }
    }

    fn stop_counter(engine: &VoxEngine) -> Arc<AtomicUsize> {
        let stops = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&stops);
        engine.set_onstop(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        stops
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..300 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    /// Renders audio in small chunks until the engine goes idle.
    async fn play_out(engine: &VoxEngine) -> bool {
        let renderer = engine.context().renderer();
        let mut block = vec![0.0; 100];
        for _ in 0..1000 {
            if !engine.is_speaking() {
                return true;
            }
            renderer.render(&mut block, 1);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        !engine.is_speaking()
    }

    #[tokio::test]
    async fn test_silence_only_finishes_without_fetching() {
        let fetcher = MockFetcher::new();
        let engine = engine(&fetcher);
        let stops = stop_counter(&engine);

        engine.speak(&crate::vox![0.5, 0.25], &settings());
        assert!(wait_until(|| stops.load(Ordering::SeqCst) == 1).await);

        assert_eq!(fetcher.request_count(), 0);
        assert!(!engine.is_speaking());
        assert_eq!(engine.context().voice_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_list_finishes() {
        let fetcher = MockFetcher::new();
        let engine = engine(&fetcher);
        let stops = stop_counter(&engine);

        engine.speak(&[], &settings());
        assert!(wait_until(|| stops.load(Ordering::SeqCst) == 1).await);
    }

    #[tokio::test]
    async fn test_timeline_follows_key_order() {
        let fetcher = MockFetcher::new()
            .with_file("vox/a.mp3", vec![0; 500])
            .with_file("vox/b.mp3", vec![0; 500])
            .with_file("vox/c.mp3", vec![0; 500]);
        let engine = engine(&fetcher);

        engine.speak(&crate::vox![0.2, "a", 0.3, "b", "c"], &settings());
        assert!(wait_until(|| engine.status().live == 3).await);

        let voices = engine.context().voices();
        let starts: Vec<f64> = voices.iter().map(|v| v.start).collect();
        // Each clip advances the cursor by duration + delay - 0.16.
        let expected = [0.2, 0.54 + 0.3, 1.18];
        for (start, want) in starts.iter().zip(expected) {
            assert!((start - want).abs() < 2e-3, "start {} != {}", start, want);
        }
        let next = engine.status().next_start.unwrap();
        assert!((next - 1.52).abs() < 1e-9);
        assert_eq!(fetcher.request_count(), 3);
    }

    #[tokio::test]
    async fn test_bounds_on_pending_and_live() {
        let fetcher = MockFetcher::new().with_default(vec![0; 100]);
        let engine = engine(&fetcher);
        let keys: Vec<VoxKey> = (0..30).map(|i| VoxKey::from(format!("k{}", i))).collect();

        engine.speak(&keys, &settings());
        assert!(wait_until(|| engine.status().live == defaults::MAX_LIVE_CLIPS).await);

        // Without rendering nothing ends, so scheduling stalls at the cap.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let status = engine.status();
        assert_eq!(status.live, defaults::MAX_LIVE_CLIPS);
        assert!(status.pending <= defaults::MAX_PENDING_REQUESTS);
        assert_eq!(fetcher.request_count(), 16);

        assert!(play_out(&engine).await);
        assert_eq!(fetcher.request_count(), 30);
    }

    #[tokio::test]
    async fn test_natural_end_reports_once() {
        let fetcher = MockFetcher::new().with_default(vec![0; 50]);
        let engine = engine(&fetcher);
        let stops = stop_counter(&engine);

        engine.speak(&crate::vox!["a", 0.1, "b"], &settings());
        assert!(play_out(&engine).await);
        assert!(wait_until(|| stops.load(Ordering::SeqCst) == 1).await);

        engine.stop();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_clips_are_skipped() {
        let fetcher = MockFetcher::new()
            .with_file("vox/a.mp3", vec![0; 200])
            .with_file("vox/broken.mp3", Vec::new())
            .with_file("vox/c.mp3", vec![0; 200]);
        let engine = engine(&fetcher);

        engine.speak(&crate::vox!["a", "missing", "broken", "c"], &settings());
        assert!(wait_until(|| engine.status().pending == 0 && engine.status().remaining_keys == 0).await);
        assert_eq!(engine.context().voice_count(), 2);
        assert!(play_out(&engine).await);
    }

    #[tokio::test]
    async fn test_stop_cancels_everything() {
        let fetcher = MockFetcher::new().with_hang();
        let engine = engine(&fetcher);
        let stops = stop_counter(&engine);

        engine.speak(&crate::vox!["a", "b", "c"], &settings());
        assert!(wait_until(|| fetcher.request_count() == 3).await);
        assert!(engine.is_speaking());

        engine.stop();
        assert!(!engine.is_speaking());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(engine.status().pending, 0);

        engine.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_silences_scheduled_clips() {
        let fetcher = MockFetcher::new().with_default(vec![0; 500]);
        let engine = engine(&fetcher);

        engine.speak(&crate::vox!["a", "b"], &settings());
        assert!(wait_until(|| engine.context().voice_count() == 2).await);

        engine.stop();
        assert_eq!(engine.context().voice_count(), 0);
    }

    #[tokio::test]
    async fn test_speak_replaces_running_session() {
        let fetcher = MockFetcher::new()
            .with_file("vox/new.mp3", vec![0; 100])
            .with_file("vox/old.mp3", vec![0; 5000]);
        let engine = engine(&fetcher);
        let stops = stop_counter(&engine);

        engine.speak(&crate::vox!["old"], &settings());
        assert!(wait_until(|| engine.context().voice_count() == 1).await);

        engine.speak(&crate::vox!["new"], &settings());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(engine.is_speaking());

        assert!(wait_until(|| engine.status().live == 1).await);
        let voices = engine.context().voices();
        assert_eq!(voices.len(), 1);
        assert!((voices[0].duration - 0.1).abs() < 1e-9);

        assert!(play_out(&engine).await);
        assert!(wait_until(|| stops.load(Ordering::SeqCst) == 2).await);
    }

    #[tokio::test]
    async fn test_chime_plays_first_at_forced_rate() {
        let fetcher = MockFetcher::new()
            .with_file("vox/chime.mp3", vec![0; 300])
            .with_file("vox/a.mp3", vec![0; 300]);
        let engine = engine(&fetcher);
        let settings = VoxSettings {
            chime: "chime.mp3".to_string(),
            rate: 1.5,
            ..settings()
        };

        engine.speak(&crate::vox!["a"], &settings);
        assert!(wait_until(|| engine.status().live == 2).await);

        let voices = engine.context().voices();
        assert_eq!(voices[0].rate, 1.0);
        assert!(voices[0].start.abs() < 2e-3);
        assert!((voices[1].rate - 1.25).abs() < 1e-9);
        // Chime 0.3s - 0.16 latency, then the 1s gap at rate 1.25.
        assert!((voices[1].start - (0.14 + 0.8)).abs() < 2e-3);
    }

    #[tokio::test]
    async fn test_volume_sets_gain() {
        let fetcher = MockFetcher::new();
        let engine = engine(&fetcher);

        engine.speak(&[], &VoxSettings { volume: 1.5, ..settings() });
        assert!((engine.context().gain() - 6.0).abs() < 1e-5);

        engine.speak(&[], &VoxSettings { volume: 0.4, ..settings() });
        assert!((engine.context().gain() - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_reverb_loads_once_and_is_cached() {
        let fetcher = MockFetcher::new()
            .with_file("vox/ir.wav", vec![0; 64])
            .with_file("vox/a.mp3", vec![0; 2000]);
        let engine = engine(&fetcher);
        let reverb = VoxSettings {
            reverb: "ir.wav".to_string(),
            ..settings()
        };

        engine.speak(&crate::vox!["a"], &reverb);
        assert!(!engine.context().has_reverb());
        assert!(wait_until(|| engine.context().has_reverb()).await);
        assert!(engine.has_impulse("ir.wav"));

        engine.speak(&[], &settings());
        assert!(!engine.context().has_reverb());

        let before = fetcher.request_count();
        engine.speak(&crate::vox!["a"], &reverb);
        assert!(engine.context().has_reverb());
        assert!(wait_until(|| fetcher.request_count() == before + 1).await);
    }

    #[tokio::test]
    async fn test_impulse_is_cached_after_its_session_ends() {
        let fetcher = MockFetcher::new().with_file("vox/ir.wav", vec![0; 64]);
        let engine = engine(&fetcher);
        let reverb = VoxSettings {
            reverb: "ir.wav".to_string(),
            ..settings()
        };

        engine.speak(&[], &reverb);
        engine.speak(&[], &settings());
        assert!(wait_until(|| engine.has_impulse("ir.wav")).await);
        assert!(!engine.context().has_reverb());
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_impulse_loading_is_shared_across_sessions() {
        let fetcher = MockFetcher::new().with_file("vox/ir.wav", vec![0; 64]);
        let engine = engine(&fetcher);
        let reverb = VoxSettings {
            reverb: "ir.wav".to_string(),
            ..settings()
        };

        engine.speak(&crate::vox![5.0], &reverb);
        engine.speak(&crate::vox![5.0], &reverb);
        assert!(wait_until(|| engine.context().has_reverb()).await);
        assert_eq!(fetcher.request_count(), 1);
        engine.stop();
    }

    #[tokio::test]
    async fn test_missing_impulse_keeps_reverb_off() {
        let fetcher = MockFetcher::new().with_file("vox/a.mp3", vec![0; 100]);
        let engine = engine(&fetcher);
        let reverb = VoxSettings {
            reverb: "missing.wav".to_string(),
            ..settings()
        };

        engine.speak(&crate::vox!["a"], &reverb);
        assert!(play_out(&engine).await);
        assert!(!engine.context().has_reverb());
        assert!(!engine.has_impulse("missing.wav"));
    }

    #[tokio::test]
    async fn test_speak_resumes_suspended_output() {
        let fetcher = MockFetcher::new().with_default(vec![0; 100]);
        let engine = engine_with(&fetcher, ManualOutput::new(RATE));
        let stops = stop_counter(&engine);
        assert!(engine.context().is_suspended());

        engine.speak(&crate::vox!["a"], &settings());
        assert!(!engine.context().is_suspended());
        assert!(engine.is_speaking());
        engine.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_when_idle() {
        let engine = engine(&MockFetcher::new());
        let status = engine.status();
        assert!(!status.speaking);
        assert_eq!(status.next_start, None);
        engine.clear_onstop();
        engine.stop();
    }
}
