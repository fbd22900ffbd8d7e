// ── Console runtime ──
//
// Drives a `ConsoleState` against real collaborators. One command-processor
// task owns the state and applies commands in arrival order; every
// side-effect descriptor runs on its own task and reports back through the
// same channel as a settlement command. The read model is broadcast on a
// `watch` channel after every change.

use std::sync::Arc;
use std::time::Duration;

use netdesk_api::BackendClient;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{Backend, PolicyEnforcement, Provisioning, Telemetry};
use crate::command::{Command, CommandEnvelope, Effect, OperationAck};
use crate::config::{ConsoleConfig, ConsoleSettings};
use crate::error::CoreError;
use crate::state::{ConsoleState, Notice};
use crate::stream::StateStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── Console ─────────────────────────────────────────────────────────

/// Running console.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Reads never wait on the
/// command channel: [`state()`](Self::state) returns the last published
/// snapshot of the read model.
pub struct Console<B: Backend> {
    inner: Arc<ConsoleInner<B>>,
}

impl<B: Backend> Clone for Console<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ConsoleInner<B> {
    backend: Arc<B>,
    settings: ConsoleSettings,
    state: watch::Sender<Arc<ConsoleState>>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: Backend> Console<B> {
    /// Start the runtime and load the first site snapshot.
    ///
    /// Fails (and stops again) when that first snapshot cannot be fetched.
    pub async fn start(backend: B, settings: ConsoleSettings) -> Result<Self, CoreError> {
        let console = Self::spawn(backend, settings).await;
        if let Err(e) = console.initial_refresh().await {
            console.shutdown().await;
            return Err(e);
        }
        info!(
            switches = console.state().inventory().switch_count(),
            "console started"
        );
        Ok(console)
    }

    async fn spawn(backend: B, settings: ConsoleSettings) -> Self {
        let (state, _) = watch::channel(Arc::new(ConsoleState::new(settings.chart_defaults)));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        let console = Self {
            inner: Arc::new(ConsoleInner {
                backend: Arc::new(backend),
                settings,
                state,
                command_tx,
                cancel: cancel.clone(),
                task_handles: Mutex::new(Vec::new()),
            }),
        };

        let mut handles = vec![tokio::spawn(command_processor_task(
            console.clone(),
            command_rx,
        ))];

        if settings.refresh_interval_secs > 0 {
            handles.push(tokio::spawn(refresh_task(
                console.clone(),
                settings.refresh_interval_secs,
                cancel.clone(),
            )));
        }

        if settings.auto_block_poll_secs > 0 {
            handles.push(tokio::spawn(auto_block_poll_task(
                console.clone(),
                settings.auto_block_poll_secs,
                cancel,
            )));
        }

        *console.inner.task_handles.lock().await = handles;
        console
    }

    async fn initial_refresh(&self) -> Result<(), CoreError> {
        self.execute(Command::Refresh).await?;
        let mut rx = self.inner.state.subscribe();
        let state = rx
            .wait_for(|s| !s.is_refreshing())
            .await
            .map_err(|_| CoreError::ConsoleStopped)?
            .clone();
        match state.refresh_error() {
            Some(err) if !state.has_snapshot() => Err(CoreError::Collaborator(err.clone())),
            _ => Ok(()),
        }
    }

    /// Stop every background task. In-flight collaborator calls are
    /// abandoned; their results never reach the state.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
        debug!("console stopped");
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.inner.settings
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Apply an operator command.
    ///
    /// Returns once the command has been applied to the state, not when the
    /// collaborator calls it started have finished; use
    /// [`wait_idle()`](Self::wait_idle) for that.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        if command.is_settlement() {
            return Err(CoreError::validation(
                "settlements are reported by collaborators, not issued",
            ));
        }
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ConsoleStopped);
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope::Execute {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ConsoleStopped)?;

        rx.await.map_err(|_| CoreError::ConsoleStopped)?
    }

    /// Drain the notices queued so far.
    pub async fn take_notices(&self) -> Result<Vec<Notice>, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope::TakeNotices { response_tx: tx })
            .await
            .map_err(|_| CoreError::ConsoleStopped)?;
        rx.await.map_err(|_| CoreError::ConsoleStopped)
    }

    // ── State observation ───────────────────────────────────────────

    /// The last published read model.
    pub fn state(&self) -> Arc<ConsoleState> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to read-model changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.inner.state.subscribe())
    }

    /// Resolve once no async slot of any kind is in flight.
    pub async fn wait_idle(&self) -> Result<Arc<ConsoleState>, CoreError> {
        let mut rx = self.inner.state.subscribe();
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(CoreError::ConsoleStopped),
            idle = rx.wait_for(|s| s.is_idle()) => idle
                .map(|s| Arc::clone(&*s))
                .map_err(|_| CoreError::ConsoleStopped),
        }
    }

    // ── Command processing ──────────────────────────────────────────

    fn process(&self, state: &mut ConsoleState, envelope: CommandEnvelope) {
        match envelope {
            CommandEnvelope::Execute {
                command,
                response_tx,
            } => {
                let result = self.apply(state, command);
                if let Err(ref e) = result {
                    debug!(error = %e, "command rejected");
                }
                let _ = response_tx.send(result);
            }
            CommandEnvelope::Settle(command) => {
                if let Err(e) = self.apply(state, command) {
                    warn!(error = %e, "settlement rejected");
                }
            }
            CommandEnvelope::TakeNotices { response_tx } => {
                let notices = state.take_notices();
                if !notices.is_empty() {
                    self.publish(state);
                }
                let _ = response_tx.send(notices);
            }
        }
    }

    fn apply(&self, state: &mut ConsoleState, command: Command) -> Result<(), CoreError> {
        let effects = state.apply(command)?;
        self.publish(state);
        for effect in effects {
            self.spawn_effect(effect);
        }
        Ok(())
    }

    fn publish(&self, state: &ConsoleState) {
        self.inner.state.send_replace(Arc::new(state.clone()));
    }

    fn spawn_effect(&self, effect: Effect) {
        debug!(effect = effect.name(), "dispatching effect");
        let backend = Arc::clone(&self.inner.backend);
        let command_tx = self.inner.command_tx.clone();
        let cancel = self.inner.cancel.clone();

        tokio::spawn(async move {
            let settlement = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                settlement = perform(backend, effect) => settlement,
            };
            let _ = command_tx.send(CommandEnvelope::Settle(settlement)).await;
        });
    }
}

/// Console driving the HTTP backend.
pub type HttpConsole = Console<BackendClient>;

impl Console<BackendClient> {
    /// Build the HTTP client from `config` and start.
    pub async fn connect(config: &ConsoleConfig) -> Result<Self, CoreError> {
        Self::start(config.client()?, config.settings).await
    }
}

// ── Effect execution ────────────────────────────────────────────────

/// Run one descriptor against the collaborators and describe the outcome
/// as the settlement command that goes back to the state.
async fn perform<B: Backend>(backend: Arc<B>, effect: Effect) -> Command {
    match effect {
        Effect::FetchSnapshot { token } => Command::SnapshotLoaded {
            token,
            outcome: backend.fetch_snapshot().await,
        },
        Effect::AddSwitch { token } => Command::OperationSettled {
            token,
            outcome: backend.add_switch().await.map(OperationAck::SwitchAdded),
        },
        Effect::AddPort { token, switch } => Command::OperationSettled {
            token,
            outcome: backend.add_port(switch).await.map(OperationAck::PortAdded),
        },
        Effect::DeletePorts { token, ports } => Command::OperationSettled {
            token,
            outcome: backend
                .delete_ports(&ports)
                .await
                .map(|()| OperationAck::Completed),
        },
        Effect::ReconfigurePorts {
            token,
            ports,
            params,
        } => Command::OperationSettled {
            token,
            outcome: backend
                .reconfigure_ports(&ports, params)
                .await
                .map(|()| OperationAck::Completed),
        },
        Effect::ApplyPolicy { token, policy } => Command::OperationSettled {
            token,
            outcome: backend
                .apply_policy(&policy)
                .await
                .map(|()| OperationAck::Completed),
        },
        Effect::UpdateAddress { token, entry, .. } => Command::OperationSettled {
            token,
            outcome: backend
                .update_address(&entry)
                .await
                .map(|()| OperationAck::Completed),
        },
        Effect::UpdateConnection { token, connection } => Command::OperationSettled {
            token,
            outcome: backend
                .update_connection(&connection)
                .await
                .map(|()| OperationAck::Completed),
        },
        Effect::LoadTabData {
            session,
            token,
            switch,
            port,
            tab,
            chart,
        } => Command::TabDataLoaded {
            session,
            token,
            outcome: backend.load_tab_data(switch, port, tab, chart).await,
        },
        Effect::RunCableTest {
            session,
            token,
            switch,
            port,
        } => Command::CableTestFinished {
            session,
            token,
            outcome: backend.run_cable_test(switch, port).await,
        },
        Effect::DiscoverDevices {
            session,
            token,
            switch,
            port,
        } => Command::DevicesDiscovered {
            session,
            token,
            outcome: backend.discover_devices(switch, port).await,
        },
        Effect::SetPortStatus { token, port, state } => Command::PortStatusApplied {
            port,
            token,
            outcome: backend.set_port_status(port, state).await,
        },
        Effect::SetPortSpeed { token, port, speed } => Command::PortSpeedApplied {
            port,
            token,
            outcome: backend.set_port_speed(port, speed).await,
        },
    }
}

// ── Background tasks ────────────────────────────────────────────────

/// Own the state and apply envelopes until cancelled.
async fn command_processor_task<B: Backend>(
    console: Console<B>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
) {
    let cancel = console.inner.cancel.clone();
    let mut state = ConsoleState::clone(&console.inner.state.borrow());

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                console.process(&mut state, envelope);
            }
        }
    }
}

/// Periodically re-fetch the site snapshot.
async fn refresh_task<B: Backend>(console: Console<B>, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = console.execute(Command::Refresh).await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Poll the enforcement side and feed any evidence in as a settlement.
async fn auto_block_poll_task<B: Backend>(
    console: Console<B>,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match console.inner.backend.auto_block_evidence().await {
                    Ok(Some(evidence)) => {
                        let command = Command::AutoBlockObserved { evidence };
                        if console.inner.command_tx.send(CommandEnvelope::Settle(command)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => debug!("auto-block poll: nothing engaged"),
                    Err(error) => {
                        let command = Command::AutoBlockPollFailed { error };
                        if console.inner.command_tx.send(CommandEnvelope::Settle(command)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}
