//! Polling client that turns provider reads into an event stream.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures::Stream;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::car_number::CarNumber;
use crate::commands::{
    BroadcastCode, CameraFocus, CameraState, ChatCommandMode, FfbCommandMode, PitCommandMode,
    ReloadTexturesMode, ReplayPositionMode, ReplaySearchMode, ReplayStateMode, TelemCommandMode,
    VideoCaptureMode,
};
use crate::provider::Provider;
use crate::session::{SessionValue, parse_session};
use crate::vars::{TelemetryFrame, read_all_variables, read_variables};
use crate::{Result, TelemetryError};

const DEFAULT_POLL_INTERVAL_MS: f64 = 16.0;
const DEFAULT_WAIT_TIMEOUT_MS: f64 = 0.0;

/// A parsed session snapshot together with the provider's update counter.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    /// Provider counter identifying this revision of the session text.
    pub update_count: i32,
    /// The parsed session tree.
    pub session_info: SessionValue,
}

/// Events emitted by [`TelemetryClient`].
#[derive(Debug, Clone)]
pub enum Event {
    /// The simulator started publishing data.
    Connect,
    /// The simulator stopped publishing data.
    Disconnect,
    /// The session text changed (or was snapshotted on connect).
    Session(SessionUpdate),
    /// One read of the selected telemetry variables.
    Telemetry(TelemetryFrame),
    /// A provider call failed inside a tick; polling continues.
    Error(Arc<TelemetryError>),
}

/// Configuration for [`TelemetryClient`].
///
/// Millisecond inputs are `f64` because callers often compute them; a
/// non-finite value falls back to the field's default rather than poisoning
/// the schedule.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    poll_interval: Duration,
    wait_timeout: Duration,
    telemetry_variables: Option<Vec<String>>,
    emit_session_on_connect: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS as u64),
            wait_timeout: Duration::ZERO,
            telemetry_variables: None,
            emit_session_on_connect: true,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay between ticks, in milliseconds. Default 16 (roughly 60Hz).
    pub fn poll_interval_ms(mut self, ms: f64) -> Self {
        self.poll_interval = sanitize_ms(ms, DEFAULT_POLL_INTERVAL_MS);
        self
    }

    /// Timeout handed to `Provider::wait_for_data`, in milliseconds.
    /// Default 0 (non-blocking poll).
    pub fn wait_timeout_ms(mut self, ms: f64) -> Self {
        self.wait_timeout = sanitize_ms(ms, DEFAULT_WAIT_TIMEOUT_MS);
        self
    }

    /// Select which variables telemetry events carry.
    ///
    /// Setting a list, even an empty one, leaves all-variables mode; an empty
    /// list suppresses telemetry events entirely.
    pub fn telemetry_variables(mut self, names: Vec<String>) -> Self {
        self.telemetry_variables = Some(names);
        self
    }

    /// Whether a connect edge immediately snapshots the current session.
    /// Default true.
    pub fn emit_session_on_connect(mut self, emit: bool) -> Self {
        self.emit_session_on_connect = emit;
        self
    }
}

fn sanitize_ms(ms: f64, default_ms: f64) -> Duration {
    let ms = if ms.is_finite() { ms.max(0.0) } else { default_ms };
    Duration::from_secs_f64(ms / 1000.0)
}

type Subscribers = Arc<StdMutex<Vec<mpsc::UnboundedSender<Event>>>>;

fn emit(subscribers: &Subscribers, event: Event) {
    let mut senders = lock_subscribers(subscribers);
    senders.retain(|tx| tx.send(event.clone()).is_ok());
}

fn lock_subscribers(
    subscribers: &Subscribers,
) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Event>>> {
    // The list is only touched for push/retain, so a poisoned lock carries no
    // broken invariant worth propagating.
    subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything a tick needs, owned by the poll task behind one mutex so ticks
/// and command calls serialize against each other.
struct Inner<P> {
    provider: P,
    wait_timeout: Duration,
    /// `None` means all-variables mode.
    selected: Option<Vec<String>>,
    emit_session_on_connect: bool,
    connected: bool,
}

/// Polling client over a [`Provider`].
///
/// `start` spawns a single task that ticks at the configured interval; each
/// tick waits for data, tracks connection edges and emits [`Event`]s to every
/// stream handed out by [`events`](Self::events). Ticks are strictly serial.
pub struct TelemetryClient<P> {
    inner: Arc<Mutex<Inner<P>>>,
    subscribers: Subscribers,
    poll_interval: Duration,
    cancel: StdMutex<Option<CancellationToken>>,
}

impl<P: Provider> TelemetryClient<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ClientOptions::default())
    }

    pub fn with_options(provider: P, options: ClientOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                provider,
                wait_timeout: options.wait_timeout,
                selected: options.telemetry_variables,
                emit_session_on_connect: options.emit_session_on_connect,
                connected: false,
            })),
            subscribers: Arc::new(StdMutex::new(Vec::new())),
            poll_interval: options.poll_interval,
            cancel: StdMutex::new(None),
        }
    }

    /// Subscribe to client events.
    ///
    /// Each call returns an independent stream; events emitted before the
    /// subscription are not replayed.
    pub fn events(&self) -> impl Stream<Item = Event> + Send + Unpin + 'static {
        let (tx, rx) = mpsc::unbounded_channel();
        lock_subscribers(&self.subscribers).push(tx);
        UnboundedReceiverStream::new(rx)
    }

    /// Start the poll task. Calling `start` while already running is a no-op.
    pub fn start(&self) {
        let mut cancel = self.lock_cancel();
        if cancel.as_ref().is_some_and(|token| !token.is_cancelled()) {
            debug!("poll task already running");
            return;
        }

        let token = CancellationToken::new();
        *cancel = Some(token.clone());

        let inner = Arc::clone(&self.inner);
        let subscribers = Arc::clone(&self.subscribers);
        let poll_interval = self.poll_interval;
        tokio::spawn(async move {
            poll_loop(inner, subscribers, poll_interval, token).await;
        });
    }

    /// Stop polling. An in-flight tick completes; connection and session
    /// state survive so a later `start` resumes without spurious edges.
    pub fn stop(&self) {
        if let Some(token) = self.lock_cancel().take() {
            debug!("stopping poll task");
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_cancel().as_ref().is_some_and(|token| !token.is_cancelled())
    }

    /// Replace the telemetry variable selection.
    ///
    /// Always leaves all-variables mode, even with an empty list (which
    /// suppresses telemetry events).
    pub async fn set_telemetry_variables(&self, names: Vec<String>) {
        let mut inner = self.inner.lock().await;
        debug!(count = names.len(), "telemetry variable selection replaced");
        inner.selected = Some(names);
    }

    /// Switch the camera to a car, preserving its number padding.
    pub async fn camera_switch_to_car(&self, car: CarNumber, group: i32, camera: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let packed = inner.provider.pad_car_number(car.value, car.pad);
        inner.provider.send_command(BroadcastCode::CamSwitchNum, packed, group, camera)
    }

    /// Switch the camera to a focus target (incident, leader, pit exit, or a
    /// car by running position).
    pub async fn camera_switch_to_position(&self, focus: CameraFocus, group: i32, camera: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::CamSwitchPos, focus.code(), group, camera)
    }

    pub async fn camera_set_state(&self, state: CameraState) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::CamSetState, state.bits(), 0, 0)
    }

    /// Queue a pit service change; `value` is fuel liters or tire pressure
    /// where the mode takes one, otherwise 0.
    pub async fn pit_command(&self, mode: PitCommandMode, value: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::PitCommand, mode as i32, value, 0)
    }

    pub async fn telemetry_command(&self, mode: TelemCommandMode) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::TelemCommand, mode as i32, 0, 0)
    }

    pub async fn chat_command(&self, mode: ChatCommandMode, macro_number: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::ChatCommand, mode as i32, macro_number, 0)
    }

    pub async fn replay_set_play_speed(&self, speed: i32, slow_motion: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(
            BroadcastCode::ReplaySetPlaySpeed,
            speed,
            slow_motion as i32,
            0,
        )
    }

    pub async fn replay_set_play_position(&self, mode: ReplayPositionMode, frame: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::ReplaySetPlayPosition, mode as i32, frame, 0)
    }

    pub async fn replay_search(&self, mode: ReplaySearchMode) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::ReplaySearch, mode as i32, 0, 0)
    }

    pub async fn replay_search_session_time(&self, session: i32, time_ms: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::ReplaySearchSessionTime, session, time_ms, 0)
    }

    pub async fn replay_set_state(&self, mode: ReplayStateMode) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::ReplaySetState, mode as i32, 0, 0)
    }

    pub async fn reload_textures(&self, mode: ReloadTexturesMode, car_index: i32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::ReloadTextures, mode as i32, car_index, 0)
    }

    /// Set a force-feedback parameter. The force is carried as a 16.16 fixed
    /// point integer on the wire.
    pub async fn ffb_command(&self, mode: FfbCommandMode, force: f32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let fixed = (force * 65536.0) as i32;
        inner.provider.send_command(BroadcastCode::FfbCommand, mode as i32, fixed, 0)
    }

    pub async fn video_capture(&self, mode: VideoCaptureMode) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.provider.send_command(BroadcastCode::VideoCapture, mode as i32, 0, 0)
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P> Drop for TelemetryClient<P> {
    fn drop(&mut self) {
        if let Ok(mut cancel) = self.cancel.lock()
            && let Some(token) = cancel.take()
        {
            token.cancel();
        }
    }
}

async fn poll_loop<P: Provider>(
    inner: Arc<Mutex<Inner<P>>>,
    subscribers: Subscribers,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    info!(interval_ms = poll_interval.as_millis() as u64, "telemetry poll loop started");

    // interval() requires a non-zero period.
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut tick_count = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("poll loop cancelled after {tick_count} ticks");
                break;
            }
            _ = ticker.tick() => {}
        }

        let mut guard = inner.lock().await;
        tick_count += 1;
        if let Err(error) = tick(&mut guard, &subscribers).await {
            warn!(%error, "tick ended early");
            emit(&subscribers, Event::Error(Arc::new(error)));
        }
    }

    info!("telemetry poll loop ended ({tick_count} ticks)");
}

/// One poll cycle. A provider error anywhere aborts the rest of the cycle but
/// leaves the connection state consistent for the next one.
async fn tick<P: Provider>(inner: &mut Inner<P>, subscribers: &Subscribers) -> Result<()> {
    let has_data = inner.provider.wait_for_data(inner.wait_timeout).await?;
    let connected = inner.provider.is_connected()?;

    if connected && !inner.connected {
        inner.connected = true;
        debug!("simulator connected");
        emit(subscribers, Event::Connect);
        if inner.emit_session_on_connect {
            // Consume the changed flag so the snapshot is not emitted twice.
            inner.provider.session_info_updated()?;
            emit_session_snapshot(inner, subscribers)?;
        }
    } else if !connected && inner.connected {
        inner.connected = false;
        debug!("simulator disconnected");
        emit(subscribers, Event::Disconnect);
    }

    if !connected || !has_data {
        trace!(connected, has_data, "idle tick");
        return Ok(());
    }

    if inner.provider.session_info_updated()? {
        emit_session_snapshot(inner, subscribers)?;
    }

    match &inner.selected {
        None => {
            if let Some(frame) = read_all_variables(&inner.provider)? {
                emit(subscribers, Event::Telemetry(frame));
            }
        }
        Some(names) if names.is_empty() => {}
        Some(names) => {
            let frame = read_variables(&inner.provider, names)?;
            emit(subscribers, Event::Telemetry(frame));
        }
    }

    Ok(())
}

/// Parse and emit the current session text; a provider with no text skips the
/// event rather than emitting an empty snapshot.
fn emit_session_snapshot<P: Provider>(inner: &mut Inner<P>, subscribers: &Subscribers) -> Result<()> {
    let Some(text) = inner.provider.session_text()? else {
        debug!("no session text published, skipping snapshot");
        return Ok(());
    };

    let update_count = inner.provider.session_update_count()?;
    trace!(update_count, bytes = text.len(), "parsing session snapshot");
    let session_info = parse_session(&text);
    emit(subscribers, Event::Session(SessionUpdate { update_count, session_info }));
    Ok(())
}
