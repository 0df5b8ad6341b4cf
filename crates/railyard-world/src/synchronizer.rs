//! World actor: an isolated Tokio task that owns the simulation.
//!
//! Connection tasks never touch the `World`. They send commands through a
//! [`WorldHandle`] and receive [`ServerMessage`]s on their own unbounded
//! channel. Every outbound message is built from owned copies taken inside
//! the actor, so no reader ever sees a half-applied change.

use std::collections::HashMap;

use railyard_protocol::{
    Recipient, RequestKind, ServerMessage, SessionId, Settings, Snapshot, TrainView,
};
use railyard_session::SessionManager;
use railyard_sim::{Ownership, TickReport, Train, World};
use railyard_tick::{TickMetrics, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{Variant, WorldConfig, WorldError};

/// Channel the actor pushes a session's outbound messages into.
pub type SessionSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to the world actor.
///
/// Variants carrying a `oneshot::Sender` get a reply; the rest are
/// fire-and-forget requests from clients.
pub(crate) enum WorldCommand {
    Connect {
        session_id: SessionId,
        sender: SessionSender,
        reply: oneshot::Sender<Result<(), WorldError>>,
    },
    Disconnect {
        session_id: SessionId,
        reply: oneshot::Sender<Result<(), WorldError>>,
    },
    Register {
        session_id: SessionId,
        name: String,
    },
    ToggleTrack {
        session_id: SessionId,
        x: i64,
        y: i64,
    },
    SpawnTrain {
        session_id: SessionId,
    },
    Step {
        reply: oneshot::Sender<TickReport>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Pause,
    Resume,
    Metrics {
        reply: oneshot::Sender<TickMetrics>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to the running world actor. Cheap to clone.
#[derive(Clone)]
pub struct WorldHandle {
    sender: mpsc::Sender<WorldCommand>,
}

impl WorldHandle {
    /// Starts tracking a session and sends it the `init` snapshot.
    ///
    /// # Errors
    /// `AlreadyConnected` if the id is in use, `Unavailable` if the actor
    /// has stopped.
    pub async fn connect(
        &self,
        session_id: SessionId,
        sender: SessionSender,
    ) -> Result<(), WorldError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Connect {
            session_id,
            sender,
            reply,
        })
        .await?;
        rx.await.map_err(|_| WorldError::Unavailable)?
    }

    /// Forgets a session and re-broadcasts the roster. The simulation is
    /// not affected.
    pub async fn disconnect(&self, session_id: SessionId) -> Result<(), WorldError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Disconnect { session_id, reply }).await?;
        rx.await.map_err(|_| WorldError::Unavailable)?
    }

    pub async fn register(&self, session_id: SessionId, name: String) -> Result<(), WorldError> {
        self.send(WorldCommand::Register { session_id, name }).await
    }

    /// Requests a track flip. Off-grid coordinates are ignored.
    pub async fn toggle_track(&self, session_id: SessionId, x: i64, y: i64) -> Result<(), WorldError> {
        self.send(WorldCommand::ToggleTrack { session_id, x, y }).await
    }

    pub async fn spawn_train(&self, session_id: SessionId) -> Result<(), WorldError> {
        self.send(WorldCommand::SpawnTrain { session_id }).await
    }

    /// Runs one tick right now, broadcasting its results like a scheduled
    /// tick would. This is how a manual-mode world advances.
    pub async fn step(&self) -> Result<TickReport, WorldError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Step { reply }).await?;
        rx.await.map_err(|_| WorldError::Unavailable)
    }

    /// A consistent copy of the full state. Reflects every command sent
    /// through this handle before the call.
    pub async fn snapshot(&self) -> Result<Snapshot, WorldError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| WorldError::Unavailable)
    }

    /// Holds scheduled ticks. Requests are still applied and `step` still
    /// works; trains just stop moving on their own.
    pub async fn pause(&self) -> Result<(), WorldError> {
        self.send(WorldCommand::Pause).await
    }

    /// Restarts scheduled ticks one period from now. Time spent paused is
    /// not caught up.
    pub async fn resume(&self) -> Result<(), WorldError> {
        self.send(WorldCommand::Resume).await
    }

    /// Counters for scheduled ticks. Ticks run through `step` are not
    /// included.
    pub async fn metrics(&self) -> Result<TickMetrics, WorldError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Metrics { reply }).await?;
        rx.await.map_err(|_| WorldError::Unavailable)
    }

    /// Stops the actor. Every session channel closes with it.
    pub async fn shutdown(&self) -> Result<(), WorldError> {
        self.send(WorldCommand::Shutdown).await
    }

    async fn send(&self, cmd: WorldCommand) -> Result<(), WorldError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| WorldError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct WorldActor {
    world: World,
    sessions: SessionManager,
    senders: HashMap<SessionId, SessionSender>,
    scheduler: TickScheduler,
    variant: Variant,
    reject_acks: bool,
    receiver: mpsc::Receiver<WorldCommand>,
}

impl WorldActor {
    async fn run(mut self) {
        tracing::info!(
            variant = ?self.variant,
            grid_size = self.world.grid().side(),
            tick_rate_hz = self.scheduler.tick_rate_hz(),
            "world actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(WorldCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = self.scheduler.wait_for_tick() => {
                    self.run_tick();
                    self.scheduler.record_tick_end();
                }
            }
        }

        tracing::info!(
            ticks = self.world.tick_count(),
            money = self.world.money(),
            "world actor stopped"
        );
    }

    fn handle(&mut self, cmd: WorldCommand) {
        match cmd {
            WorldCommand::Connect {
                session_id,
                sender,
                reply,
            } => {
                let _ = reply.send(self.handle_connect(session_id, sender));
            }
            WorldCommand::Disconnect { session_id, reply } => {
                let _ = reply.send(self.handle_disconnect(session_id));
            }
            WorldCommand::Register { session_id, name } => {
                self.handle_register(session_id, &name);
            }
            WorldCommand::ToggleTrack { session_id, x, y } => {
                self.handle_toggle(session_id, x, y);
            }
            WorldCommand::SpawnTrain { session_id } => {
                self.handle_spawn(session_id);
            }
            WorldCommand::Step { reply } => {
                let _ = reply.send(self.run_tick());
            }
            WorldCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            WorldCommand::Pause => self.scheduler.pause(),
            WorldCommand::Resume => self.scheduler.resume(),
            WorldCommand::Metrics { reply } => {
                let _ = reply.send(self.scheduler.metrics().clone());
            }
            // Handled by the run loop.
            WorldCommand::Shutdown => {}
        }
    }

    fn handle_connect(
        &mut self,
        session_id: SessionId,
        sender: SessionSender,
    ) -> Result<(), WorldError> {
        self.sessions.create(session_id)?;
        self.senders.insert(session_id, sender);
        self.dispatch(Recipient::Session(session_id), ServerMessage::Init(self.snapshot()));
        tracing::info!(%session_id, sessions = self.sessions.len(), "session connected");
        Ok(())
    }

    fn handle_disconnect(&mut self, session_id: SessionId) -> Result<(), WorldError> {
        self.senders.remove(&session_id);
        self.sessions.remove(session_id)?;
        self.broadcast_roster();
        tracing::info!(%session_id, sessions = self.sessions.len(), "session disconnected");
        Ok(())
    }

    fn handle_register(&mut self, session_id: SessionId, name: &str) {
        if let Err(e) = self.sessions.register(session_id, name) {
            tracing::warn!(%session_id, error = %e, "register from unknown session, ignoring");
            return;
        }
        self.broadcast_roster();
    }

    fn handle_toggle(&mut self, session_id: SessionId, x: i64, y: i64) {
        if !self.is_connected(session_id, "toggleTrack") {
            return;
        }

        let ownership = match self.variant {
            Variant::Multiplayer => Some(Ownership {
                owner: session_id.to_string(),
                color: self.sessions.color_of(session_id),
            }),
            Variant::SingleTrain => None,
        };

        let toggled = match (i32::try_from(x), i32::try_from(y)) {
            (Ok(x), Ok(y)) => self.world.toggle_track(x, y, ownership),
            _ => None,
        };

        match toggled {
            Some(present) => {
                tracing::debug!(%session_id, x, y, present, "track toggled");
                self.dispatch(Recipient::All, ServerMessage::UpdateGrid(self.world.grid_rows()));
            }
            None => self.reject(session_id, RequestKind::ToggleTrack, "cell is off the grid"),
        }
    }

    fn handle_spawn(&mut self, session_id: SessionId) {
        if !self.is_connected(session_id, "startTrain") {
            return;
        }

        match self.world.spawn_train() {
            Some(train) => {
                let view = self.view(&train);
                self.dispatch(Recipient::All, ServerMessage::TrainSpawn(view));
            }
            None => {
                let (x, y) = self.world.config().spawn_cell();
                let reason = if self.world.grid().has_track(x, y) {
                    "train limit reached"
                } else {
                    "no track at the spawn cell"
                };
                self.reject(session_id, RequestKind::StartTrain, reason);
            }
        }
    }

    /// One simulation step followed by its broadcasts: a `moneyUpdate` per
    /// credit, then `state` with the trains still running.
    fn run_tick(&mut self) -> TickReport {
        let report = self.world.tick();
        for delivery in &report.deliveries {
            tracing::info!(
                tick = report.tick,
                train_id = %delivery.completion.train_id,
                money = delivery.money,
                "delivery credited"
            );
            self.dispatch(Recipient::All, ServerMessage::MoneyUpdate(delivery.money));
        }

        let trains = self.world.trains().iter().map(|t| self.view(t)).collect();
        self.dispatch(Recipient::All, ServerMessage::State { trains });
        self.sessions.mark_state_sent(report.tick);
        report
    }

    fn snapshot(&self) -> Snapshot {
        let config = self.world.config();
        Snapshot {
            grid: self.world.grid_rows(),
            money: self.world.money(),
            trains: self.world.trains().iter().map(|t| self.view(t)).collect(),
            industries: self.world.industries().to_vec(),
            settings: Settings {
                train_speed: config.train_speed,
                grid_size: config.grid_size,
            },
        }
    }

    fn view(&self, train: &Train) -> TrainView {
        match self.variant {
            Variant::Multiplayer => TrainView::full(train),
            Variant::SingleTrain => TrainView::compact(train),
        }
    }

    fn is_connected(&self, session_id: SessionId, request: &str) -> bool {
        let connected = self.sessions.contains(session_id);
        if !connected {
            tracing::warn!(%session_id, request, "request from unknown session, ignoring");
        }
        connected
    }

    fn reject(&self, session_id: SessionId, request: RequestKind, reason: &str) {
        tracing::debug!(%session_id, ?request, reason, "request had no effect");
        if self.reject_acks {
            self.dispatch(
                Recipient::Session(session_id),
                ServerMessage::Rejected {
                    request,
                    reason: reason.to_owned(),
                },
            );
        }
    }

    fn broadcast_roster(&self) {
        self.dispatch(Recipient::All, ServerMessage::PlayerList(self.sessions.roster()));
    }

    /// Sends `msg` to every addressed session. A closed channel means the
    /// connection task is already gone; its disconnect is on the way.
    fn dispatch(&self, recipient: Recipient, msg: ServerMessage) {
        if let Recipient::Session(id) = recipient {
            if let Some(sender) = self.senders.get(&id) {
                let _ = sender.send(msg);
            }
            return;
        }
        for (id, sender) in &self.senders {
            if recipient.includes(*id) {
                let _ = sender.send(msg.clone());
            }
        }
    }
}

/// Spawns the world actor and returns a handle to it.
pub fn spawn_world(config: WorldConfig) -> WorldHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = WorldActor {
        world: World::new(config.sim),
        sessions: SessionManager::new(config.session),
        senders: HashMap::new(),
        scheduler: TickScheduler::new(config.tick),
        variant: config.variant,
        reject_acks: config.reject_acks,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    WorldHandle { sender: tx }
}
