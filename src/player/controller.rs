use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::resolver::EngineEventSink;
use super::session::{PlayRequest, PlaybackSession, SessionState};
use super::traits::{AdaptiveEngineFactory, MediaElement};
use super::types::{EngineEvent, MediaEvent, TransportMode};
use crate::config::Config;
use crate::gesture::{
    GestureEffect, GestureEvent, GestureMachine, GestureOverlay, GesturePhase, TimerToken,
    TouchInput,
};
use crate::models::{AttachmentId, VideoId, VideoRecord};
use crate::utils::{ControllerError, MediaError};

/// Everything the UI needs to render one feed item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemState {
    pub session: SessionState,
    pub gesture: GesturePhase,
    pub overlay: Option<GestureOverlay>,
    pub heart_visible: bool,
}

/// Commands that can be sent to an item controller
#[derive(Debug)]
pub enum ItemCommand {
    /// Mark the item active or inactive
    SetActive {
        active: bool,
        respond_to: oneshot::Sender<()>,
    },
    TogglePlay {
        respond_to: oneshot::Sender<()>,
    },
    ToggleMute {
        respond_to: oneshot::Sender<bool>,
    },
    ToggleLike {
        respond_to: oneshot::Sender<bool>,
    },
    /// Set playback rate, answers with the rate actually applied
    SetSpeed {
        rate: f64,
        respond_to: oneshot::Sender<f64>,
    },
    Seek {
        position: Duration,
        respond_to: oneshot::Sender<()>,
    },
    /// Replace the displayed record
    LoadRecord {
        record: VideoRecord,
        respond_to: oneshot::Sender<TransportMode>,
    },
    /// Raw touch input, answers whether the gesture layer consumed it
    Touch {
        input: TouchInput,
        respond_to: oneshot::Sender<bool>,
    },
    /// Event raised by the media element
    Media(MediaEvent),
    /// Event raised by an adaptive engine, tagged with its attachment
    Engine {
        attachment: AttachmentId,
        event: EngineEvent,
    },
    ArmTimerFired(TimerToken),
    HeartExpired(u64),
    PlaySettled(Result<(), MediaError>),
    /// Release the transport and stop the controller
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Actor owning the playback session and gesture state of one mounted item.
///
/// Timers and engine callbacks only hold weak senders, so the controller
/// stops once every handle is gone.
pub struct ItemController {
    receiver: mpsc::UnboundedReceiver<ItemCommand>,
    sender: mpsc::WeakUnboundedSender<ItemCommand>,
    session: PlaybackSession,
    gestures: GestureMachine,
    state_tx: watch::Sender<ItemState>,
    arm_timer: Option<(TimerToken, CancellationToken)>,
    heart_timer: Option<CancellationToken>,
    heart_generation: u64,
    heart_visible: bool,
    overlay: Option<GestureOverlay>,
}

impl ItemController {
    pub fn new(
        record: VideoRecord,
        element: Arc<dyn MediaElement>,
        engines: Arc<dyn AdaptiveEngineFactory>,
        config: &Config,
    ) -> (ItemHandle, ItemController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let weak = sender.downgrade();

        let sink_sender = weak.clone();
        let sink: EngineEventSink = Arc::new(move |attachment, event| {
            if let Some(sender) = sink_sender.upgrade() {
                let _ = sender.send(ItemCommand::Engine { attachment, event });
            }
        });

        let session = PlaybackSession::new(record, element, engines, config, sink);
        let gestures = GestureMachine::new(config.gestures.clone());

        let initial = ItemState {
            session: session.state(),
            gesture: gestures.phase(),
            overlay: None,
            heart_visible: false,
        };
        let (state_tx, state_rx) = watch::channel(initial);

        let controller = ItemController {
            receiver,
            sender: weak,
            session,
            gestures,
            state_tx,
            arm_timer: None,
            heart_timer: None,
            heart_generation: 0,
            heart_visible: false,
            overlay: None,
        };

        let handle = ItemHandle {
            sender,
            state: state_rx,
        };

        (handle, controller)
    }

    /// Create a controller and run it on the current runtime
    pub fn spawn(
        record: VideoRecord,
        element: Arc<dyn MediaElement>,
        engines: Arc<dyn AdaptiveEngineFactory>,
        config: &Config,
    ) -> ItemHandle {
        let (handle, controller) = Self::new(record, element, engines, config);
        tokio::spawn(controller.run());
        handle
    }

    /// Run the controller event loop
    pub async fn run(mut self) {
        let video_id = self.video_id();
        info!("Item controller started for video {}", video_id);

        let mut shutdown = None;
        while let Some(command) = self.receiver.recv().await {
            match command {
                ItemCommand::Shutdown { respond_to } => {
                    shutdown = Some(respond_to);
                    break;
                }
                command => {
                    self.handle_command(command);
                    self.publish();
                }
            }
        }

        self.teardown();
        if let Some(respond_to) = shutdown {
            let _ = respond_to.send(());
        }
        info!("Item controller stopped for video {}", video_id);
    }

    fn video_id(&self) -> VideoId {
        self.session.record().id
    }

    fn handle_command(&mut self, command: ItemCommand) {
        match command {
            ItemCommand::SetActive { active, respond_to } => {
                if !active {
                    self.abandon_gesture();
                }
                if let Some(request) = self.session.set_active(active) {
                    self.issue_play(request);
                }
                let _ = respond_to.send(());
            }
            ItemCommand::TogglePlay { respond_to } => {
                if let Some(request) = self.session.toggle_play() {
                    self.issue_play(request);
                }
                let _ = respond_to.send(());
            }
            ItemCommand::ToggleMute { respond_to } => {
                let _ = respond_to.send(self.session.toggle_mute());
            }
            ItemCommand::ToggleLike { respond_to } => {
                let _ = respond_to.send(self.session.toggle_like());
            }
            ItemCommand::SetSpeed { rate, respond_to } => {
                let _ = respond_to.send(self.session.set_speed(rate));
            }
            ItemCommand::Seek {
                position,
                respond_to,
            } => {
                self.session.seek_to(position);
                let _ = respond_to.send(());
            }
            ItemCommand::LoadRecord { record, respond_to } => {
                self.abandon_gesture();
                self.session.load_record(record);
                if self.session.is_active() && !self.session.load_state().is_error() {
                    // Ready will ask for play once the new source is loaded
                    self.session.element().pause();
                }
                let _ = respond_to.send(self.session.transport());
            }
            ItemCommand::Touch { input, respond_to } => {
                let consumed = self.handle_touch(input);
                let _ = respond_to.send(consumed);
            }
            ItemCommand::Media(event) => {
                if let Some(request) = self.session.handle_media_event(event) {
                    self.issue_play(request);
                }
            }
            ItemCommand::Engine { attachment, event } => {
                if let Some(request) = self.session.handle_engine_event(attachment, event) {
                    self.issue_play(request);
                }
            }
            ItemCommand::ArmTimerFired(token) => {
                if matches!(&self.arm_timer, Some((pending, _)) if *pending == token) {
                    self.arm_timer = None;
                }
                let media = self.session.position();
                let output = self.gestures.handle(GestureEvent::ArmTimerFired { token, media });
                self.apply_effects(output.effects);
            }
            ItemCommand::HeartExpired(generation) => {
                if generation == self.heart_generation {
                    self.heart_visible = false;
                    self.heart_timer = None;
                }
            }
            ItemCommand::PlaySettled(result) => {
                self.session.on_play_settled(result);
            }
            ItemCommand::Shutdown { respond_to } => {
                let _ = respond_to.send(());
            }
        }
    }

    fn handle_touch(&mut self, input: TouchInput) -> bool {
        let now = Instant::now().into_std();
        let event = match input {
            TouchInput::Start { x, y, target } => GestureEvent::TouchStart {
                x,
                y,
                at: now,
                target,
            },
            TouchInput::Move { x, y } => GestureEvent::TouchMove { x, y },
            TouchInput::End => GestureEvent::TouchEnd { at: now },
            TouchInput::Cancel => GestureEvent::TouchCancel,
        };

        let output = self.gestures.handle(event);
        self.apply_effects(output.effects);
        output.consumed
    }

    /// End any live gesture as if the finger was lifted off-screen
    fn abandon_gesture(&mut self) {
        if self.gestures.phase() != GesturePhase::Idle {
            let output = self.gestures.handle(GestureEvent::TouchCancel);
            self.apply_effects(output.effects);
        }
    }

    fn apply_effects(&mut self, effects: Vec<GestureEffect>) {
        for effect in effects {
            trace!("Applying gesture effect {:?}", effect);
            match effect {
                GestureEffect::ScheduleArmTimer { token, delay } => {
                    self.schedule_arm_timer(token, delay);
                }
                GestureEffect::CancelArmTimer { token } => {
                    if let Some((pending, cancel)) = self.arm_timer.take() {
                        if pending == token {
                            cancel.cancel();
                        } else {
                            self.arm_timer = Some((pending, cancel));
                        }
                    }
                }
                GestureEffect::SeekTo(position) => self.session.seek_to(position),
                GestureEffect::SetRate(rate) => {
                    self.session.set_speed(rate);
                }
                GestureEffect::ResetRate => {
                    self.session.set_speed(1.0);
                }
                GestureEffect::ShowOverlay(overlay) => self.overlay = Some(overlay),
                GestureEffect::HideOverlay => self.overlay = None,
                GestureEffect::TogglePlay => {
                    if let Some(request) = self.session.toggle_play() {
                        self.issue_play(request);
                    }
                }
                GestureEffect::Like => self.session.like(),
                GestureEffect::ShowHeart { duration } => self.show_heart(duration),
            }
        }
    }

    fn schedule_arm_timer(&mut self, token: TimerToken, delay: Duration) {
        if let Some((_, previous)) = self.arm_timer.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        let sleep = tokio::time::sleep(delay);
        let sender = self.sender.clone();
        let cancelled = cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = sleep => {
                    if let Some(sender) = sender.upgrade() {
                        let _ = sender.send(ItemCommand::ArmTimerFired(token));
                    }
                }
            }
        });

        self.arm_timer = Some((token, cancel));
    }

    fn show_heart(&mut self, duration: Duration) {
        if let Some(previous) = self.heart_timer.take() {
            previous.cancel();
        }

        self.heart_generation = self.heart_generation.wrapping_add(1);
        self.heart_visible = true;

        let generation = self.heart_generation;
        let cancel = CancellationToken::new();
        let sleep = tokio::time::sleep(duration);
        let sender = self.sender.clone();
        let cancelled = cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = sleep => {
                    if let Some(sender) = sender.upgrade() {
                        let _ = sender.send(ItemCommand::HeartExpired(generation));
                    }
                }
            }
        });

        self.heart_timer = Some(cancel);
    }

    fn issue_play(&self, _request: PlayRequest) {
        let element = self.session.element();
        let sender = self.sender.clone();
        let video_id = self.video_id();

        tokio::spawn(async move {
            let result = element.play().await;
            match sender.upgrade() {
                Some(sender) => {
                    let _ = sender.send(ItemCommand::PlaySettled(result));
                }
                None => debug!("Play settled after controller for video {} stopped", video_id),
            }
        });
    }

    fn teardown(&mut self) {
        if let Some((_, cancel)) = self.arm_timer.take() {
            cancel.cancel();
        }
        if let Some(cancel) = self.heart_timer.take() {
            cancel.cancel();
        }
        self.session.teardown();
        self.publish();
    }

    fn publish(&self) {
        let state = ItemState {
            session: self.session.state(),
            gesture: self.gestures.phase(),
            overlay: self.overlay,
            heart_visible: self.heart_visible,
        };
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

/// Handle for communicating with an item controller
#[derive(Debug, Clone)]
pub struct ItemHandle {
    sender: mpsc::UnboundedSender<ItemCommand>,
    state: watch::Receiver<ItemState>,
}

impl ItemHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ItemCommand,
    ) -> Result<T, ControllerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| ControllerError::Disconnected)?;
        response.await.map_err(|_| ControllerError::NoResponse)
    }

    pub async fn set_active(&self, active: bool) -> Result<(), ControllerError> {
        self.request(|respond_to| ItemCommand::SetActive { active, respond_to })
            .await
    }

    pub async fn toggle_play(&self) -> Result<(), ControllerError> {
        self.request(|respond_to| ItemCommand::TogglePlay { respond_to })
            .await
    }

    /// Returns the new muted flag
    pub async fn toggle_mute(&self) -> Result<bool, ControllerError> {
        self.request(|respond_to| ItemCommand::ToggleMute { respond_to })
            .await
    }

    /// Returns the new liked flag
    pub async fn toggle_like(&self) -> Result<bool, ControllerError> {
        self.request(|respond_to| ItemCommand::ToggleLike { respond_to })
            .await
    }

    pub async fn set_speed(&self, rate: f64) -> Result<f64, ControllerError> {
        self.request(|respond_to| ItemCommand::SetSpeed { rate, respond_to })
            .await
    }

    pub async fn seek(&self, position: Duration) -> Result<(), ControllerError> {
        self.request(|respond_to| ItemCommand::Seek {
            position,
            respond_to,
        })
        .await
    }

    pub async fn load_record(&self, record: VideoRecord) -> Result<TransportMode, ControllerError> {
        self.request(|respond_to| ItemCommand::LoadRecord { record, respond_to })
            .await
    }

    /// Feed a touch to the gesture layer; `true` when it must not propagate further
    pub async fn touch(&self, input: TouchInput) -> Result<bool, ControllerError> {
        self.request(|respond_to| ItemCommand::Touch { input, respond_to })
            .await
    }

    /// Forward an element event; does not wait for it to be handled
    pub fn media_event(&self, event: MediaEvent) -> Result<(), ControllerError> {
        self.sender
            .send(ItemCommand::Media(event))
            .map_err(|_| ControllerError::Disconnected)
    }

    /// Release the transport and stop the controller
    pub async fn shutdown(&self) -> Result<(), ControllerError> {
        self.request(|respond_to| ItemCommand::Shutdown { respond_to })
            .await
    }

    pub fn state(&self) -> ItemState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ItemState> {
        self.state.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
