// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{Indexed, PanelState, ThermostatView};
use crate::command::{Command, CommandBuilder, OutputValue, Season, ThermostatMode};
use crate::config::ClientConfig;
use crate::correlator::{Correlator, Snapshot};
use crate::error::{Lares4Error, Result};
use crate::event::{ChangeChannels, ChangeEvent, ChangeReceiver};
use crate::logger::{Logger, TracingLogger};
use crate::protocol::{
    BusPeripheral, Envelope, InboundFrame, LoginReply, OutputConfig, OutputStatus, ProgramOutput,
    Scenario, SensorStatus, SystemStatus, TemperatureStatus, ThermostatConfig,
};
use crate::session::Session;
use crate::state::ConnectionState;
use crate::transport::{websocket, FrameLink};

/// Command builder and the queue its envelopes go out on, locked together
/// so frames leave in ID order.
struct Outbox {
    builder: CommandBuilder,
    outgoing: Option<mpsc::Sender<String>>,
}

/// A logged-in, bootstrapped connection to a Lares4 panel.
///
/// # Example
///
/// ```no_run
/// use lares4::{ClientConfig, Lares4Client, OutputValue};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ClientConfig::builder()
///         .host("192.168.1.100")
///         .sender("monitor")
///         .pin("123456")
///         .build();
///
///     let mut client = Lares4Client::connect(config).await?;
///
///     let mut outputs = client.subscribe_outputs();
///     tokio::spawn(async move {
///         while let Ok(change) = outputs.recv().await {
///             println!("Output #{}: {}", change.position, change.status);
///         }
///     });
///
///     for light in client.lights().await {
///         println!("Light #{}: {}", light.position, light.details.description);
///     }
///
///     client.set_output("1", OutputValue::On).await?;
///
///     tokio::signal::ctrl_c().await?;
///     client.close().await?;
///     Ok(())
/// }
/// ```
pub struct Lares4Client {
    sender: String,
    outbox: Mutex<Outbox>,
    state: Arc<RwLock<PanelState>>,
    channels: ChangeChannels,
    connection: Arc<watch::Sender<ConnectionState>>,
    logger: Arc<dyn Logger>,
    listener_handle: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Lares4Client {
    /// Connect over TLS WebSocket, log in and load the panel snapshot.
    ///
    /// Fails on the first error: a rejected login or an unusable bootstrap
    /// reply is fatal, and there are no retries.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with_logger(config, Arc::new(TracingLogger)).await
    }

    /// [`connect`](Self::connect) with a caller-supplied logger.
    pub async fn connect_with_logger(config: ClientConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        config.validate()?;
        let connection = Arc::new(watch::channel(ConnectionState::Disconnected).0);
        advance(&connection, ConnectionState::Connecting)?;

        logger.info(&format!("Connecting to Lares4 panel at {}", config.host));
        let link = match websocket::connect(&config).await {
            Ok(link) => link,
            Err(e) => {
                logger.error(&format!("Failed to connect to {}: {}", config.host, e));
                let _ = advance(&connection, ConnectionState::Closed);
                return Err(e);
            }
        };
        logger.info("Connected to Lares4 panel");

        Self::run_handshake(config, link, logger, connection).await
    }

    /// Run the login and bootstrap over an already open link.
    ///
    /// Used with [`transport::memory`](crate::transport::memory) links in
    /// tests and simulations.
    pub async fn establish(
        config: ClientConfig,
        link: FrameLink,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        config.validate()?;
        let connection = Arc::new(watch::channel(ConnectionState::Disconnected).0);
        advance(&connection, ConnectionState::Connecting)?;
        Self::run_handshake(config, link, logger, connection).await
    }

    async fn run_handshake(
        config: ClientConfig,
        link: FrameLink,
        logger: Arc<dyn Logger>,
        connection: Arc<watch::Sender<ConnectionState>>,
    ) -> Result<Self> {
        let FrameLink {
            outgoing,
            mut incoming,
        } = link;
        let mut builder = CommandBuilder::new(Session::new(&config.sender, &config.pin));

        let handshake = async {
            login(&config, &mut builder, &outgoing, &mut incoming, &connection, &*logger).await?;
            bootstrap(&config, &mut builder, &outgoing, &mut incoming, &connection, &*logger).await
        };
        let snapshot = match handshake.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                logger.error(&format!("Initialization failed: {}", e));
                let _ = advance(&connection, ConnectionState::Closed);
                return Err(e);
            }
        };

        let state = PanelState::from_snapshot(snapshot);
        log_summary(&state, &*logger);
        advance(&connection, ConnectionState::Ready)?;
        logger.info("Initialization completed");

        let state = Arc::new(RwLock::new(state));
        let channels = ChangeChannels::new(config.event_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener_handle = tokio::spawn(listen(
            incoming,
            Arc::clone(&state),
            channels.clone(),
            config.sender.clone(),
            Arc::clone(&connection),
            Arc::clone(&logger),
            shutdown_rx,
        ));
        logger.info("Listening for updates");

        Ok(Self {
            sender: config.sender,
            outbox: Mutex::new(Outbox {
                builder,
                outgoing: Some(outgoing),
            }),
            state,
            channels,
            connection,
            logger,
            listener_handle: Some(listener_handle),
            shutdown_tx,
        })
    }

    // --- Connection ---

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Follow connection state changes, e.g. to notice the panel going away.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Our sender identity.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    // --- Events ---

    pub fn subscribe_outputs(&self) -> ChangeReceiver<OutputStatus> {
        self.channels.outputs()
    }

    pub fn subscribe_sensors(&self) -> ChangeReceiver<SensorStatus> {
        self.channels.sensors()
    }

    pub fn subscribe_temperatures(&self) -> ChangeReceiver<TemperatureStatus> {
        self.channels.temperatures()
    }

    // --- Snapshots ---

    /// Copy of the whole cache.
    pub async fn snapshot(&self) -> PanelState {
        self.state.read().await.clone()
    }

    pub async fn output_configs(&self) -> Vec<OutputConfig> {
        self.state.read().await.output_configs().items().to_vec()
    }

    pub async fn peripherals(&self) -> Vec<BusPeripheral> {
        self.state.read().await.peripherals().items().to_vec()
    }

    pub async fn outputs(&self) -> Vec<OutputStatus> {
        self.state.read().await.outputs().items().to_vec()
    }

    pub async fn systems(&self) -> Vec<SystemStatus> {
        self.state.read().await.systems().items().to_vec()
    }

    pub async fn sensors(&self) -> Vec<SensorStatus> {
        self.state.read().await.sensors().items().to_vec()
    }

    pub async fn temperatures(&self) -> Vec<TemperatureStatus> {
        self.state.read().await.temperatures().items().to_vec()
    }

    pub async fn thermostat_configs(&self) -> Vec<ThermostatConfig> {
        self.state.read().await.thermostats().items().to_vec()
    }

    pub async fn scenarios(&self) -> Vec<Scenario> {
        self.state.read().await.scenarios().items().to_vec()
    }

    pub async fn program_outputs(&self) -> Vec<ProgramOutput> {
        self.state.read().await.program_outputs().items().to_vec()
    }

    /// Current status of an output, by protocol ID.
    pub async fn output_status(&self, id: &str) -> Option<OutputStatus> {
        self.state.read().await.outputs().by_id(id).cloned()
    }

    pub async fn lights(&self) -> Vec<Indexed<OutputConfig>> {
        self.state.read().await.lights()
    }

    pub async fn dimmers(&self) -> Vec<Indexed<OutputConfig>> {
        self.state.read().await.dimmers()
    }

    pub async fn shutters(&self) -> Vec<Indexed<OutputConfig>> {
        self.state.read().await.shutters()
    }

    pub async fn user_scenarios(&self) -> Vec<Indexed<Scenario>> {
        self.state.read().await.user_scenarios()
    }

    pub async fn thermostats(&self) -> Vec<ThermostatView> {
        self.state.read().await.thermostat_views()
    }

    // --- Commands ---

    /// Send a command. Nothing waits for the panel's acknowledgement; the
    /// effect shows up as a push update.
    pub async fn send_command(&self, command: &Command) -> Result<()> {
        let state = self.connection_state();
        if !state.is_ready() {
            return Err(Lares4Error::NotReady { state });
        }

        let mut outbox = self.outbox.lock().await;
        let envelope = outbox.builder.command(command)?;
        let outgoing = outbox.outgoing.as_ref().ok_or(Lares4Error::Disconnected)?;
        transmit(outgoing, &envelope, &*self.logger).await
    }

    /// Switch, dim or move an output.
    pub async fn set_output(&self, id: &str, value: OutputValue) -> Result<()> {
        self.send_command(&Command::SetOutput {
            id: id.to_string(),
            value,
        })
        .await
    }

    pub async fn trigger_scenario(&self, id: &str) -> Result<()> {
        self.send_command(&Command::TriggerScenario { id: id.to_string() })
            .await
    }

    pub async fn set_thermostat_mode(&self, id: &str, mode: ThermostatMode) -> Result<()> {
        self.send_command(&Command::SetThermostatMode {
            id: id.to_string(),
            mode,
        })
        .await
    }

    /// Set when manual mode ends, in the panel's `MAN_HRS` format.
    pub async fn set_thermostat_manual_ending(&self, id: &str, hours: &str) -> Result<()> {
        self.send_command(&Command::SetThermostatManualEnding {
            id: id.to_string(),
            hours: hours.to_string(),
        })
        .await
    }

    pub async fn set_thermostat_season(&self, id: &str, season: Season) -> Result<()> {
        self.send_command(&Command::SetThermostatSeason {
            id: id.to_string(),
            season,
        })
        .await
    }

    /// Set the manual target temperature of a season.
    pub async fn set_thermostat_target(&self, id: &str, season: Season, target: f64) -> Result<()> {
        self.send_command(&Command::SetThermostatTarget {
            id: id.to_string(),
            season,
            target,
        })
        .await
    }

    /// Stop listening and close the connection. The cache stays readable.
    pub async fn close(&mut self) -> Result<()> {
        if self.connection_state().is_closed() && self.listener_handle.is_none() {
            return Ok(());
        }
        self.logger.info("Closing connection to Lares4 panel");
        let _ = self.shutdown_tx.send(true);
        if let Some(h) = self.listener_handle.take() {
            h.abort();
        }
        // dropping the last sender makes the writer close the socket
        self.outbox.lock().await.outgoing = None;
        let _ = advance(&self.connection, ConnectionState::Closed);
        Ok(())
    }
}

impl Drop for Lares4Client {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(h) = self.listener_handle.take() {
            h.abort();
        }
    }
}

/// Move the shared connection state, rejecting illegal transitions.
fn advance(connection: &watch::Sender<ConnectionState>, next: ConnectionState) -> Result<()> {
    let mut outcome = Ok(());
    connection.send_if_modified(|current| match current.transition_to(next) {
        Ok(()) => true,
        Err(e) => {
            outcome = Err(e);
            false
        }
    });
    outcome
}

/// Await `future`, bounded by `limit` when one is set.
async fn within<F: Future>(limit: Option<Duration>, phase: &'static str, future: F) -> Result<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| Lares4Error::Timeout { phase }),
        None => Ok(future.await),
    }
}

async fn transmit(outgoing: &mpsc::Sender<String>, envelope: &Envelope, logger: &dyn Logger) -> Result<()> {
    logger.debug(&format!(
        "Sending command {} ({}) #{}",
        envelope.command, envelope.payload_type, envelope.id
    ));
    outgoing
        .send(envelope.to_json()?)
        .await
        .map_err(|_| Lares4Error::Disconnected)
}

async fn login(
    config: &ClientConfig,
    builder: &mut CommandBuilder,
    outgoing: &mpsc::Sender<String>,
    incoming: &mut mpsc::Receiver<String>,
    connection: &watch::Sender<ConnectionState>,
    logger: &dyn Logger,
) -> Result<()> {
    advance(connection, ConnectionState::AwaitingLogin)?;
    transmit(outgoing, &builder.command(&Command::Login)?, logger).await?;

    let text = within(config.login_timeout, "login", incoming.recv())
        .await?
        .ok_or(Lares4Error::Disconnected)?;
    let frame = InboundFrame::parse(&text).map_err(|e| Lares4Error::AuthenticationFailed {
        details: format!("unreadable login reply: {e}"),
    })?;
    let reply = LoginReply::from_payload(&frame.payload)?;

    builder.set_login_token(reply.login_token);
    logger.info(&format!("Logged in to Lares4 as {}", reply.description));
    advance(connection, ConnectionState::Authenticated)
}

async fn bootstrap(
    config: &ClientConfig,
    builder: &mut CommandBuilder,
    outgoing: &mpsc::Sender<String>,
    incoming: &mut mpsc::Receiver<String>,
    connection: &watch::Sender<ConnectionState>,
    logger: &dyn Logger,
) -> Result<Snapshot> {
    advance(connection, ConnectionState::Bootstrapping)?;
    let (mut correlator, pending) = Correlator::new();

    for command in [
        Command::ReadAccessories,
        Command::RegisterStatus,
        Command::ReadConfiguration,
    ] {
        transmit(outgoing, &builder.command(&command)?, logger).await?;
    }

    // Feed replies to the correlator until every query is settled. Runs
    // alongside the join so a rejected query ends the bootstrap at once.
    let pump = async {
        while !correlator.is_complete() {
            let text = incoming.recv().await.ok_or(Lares4Error::Disconnected)?;
            match InboundFrame::parse(&text) {
                Ok(frame) => {
                    if let Some(kind) = correlator.route(&frame.payload) {
                        logger.debug(&format!("Received {} reply", kind));
                    }
                }
                Err(e) => warn!("Ignoring unreadable frame during bootstrap: {}", e),
            }
        }
        Ok::<(), Lares4Error>(())
    };

    let joined = within(config.bootstrap_timeout, "bootstrap", async {
        tokio::try_join!(pump, pending.join())
    })
    .await?;
    let ((), snapshot) = joined?;
    Ok(snapshot)
}

fn log_summary(state: &PanelState, logger: &dyn Logger) {
    logger.info(&format!(
        "Loaded {} outputs, {} peripherals, {} sensors, {} systems, {} temperatures, {} thermostats, {} scenarios",
        state.output_configs().len(),
        state.peripherals().len(),
        state.sensors().len(),
        state.systems().len(),
        state.temperatures().len(),
        state.thermostats().len(),
        state.scenarios().len(),
    ));
    for system in state.systems().items() {
        logger.debug(&system.to_string());
    }
    for sensor in state.sensors().items() {
        logger.debug(&sensor.to_string());
    }
}

/// Apply push updates until the link closes or shutdown is signalled.
async fn listen(
    mut incoming: mpsc::Receiver<String>,
    state: Arc<RwLock<PanelState>>,
    channels: ChangeChannels,
    receiver: String,
    connection: Arc<watch::Sender<ConnectionState>>,
    logger: Arc<dyn Logger>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            frame = incoming.recv() => {
                let Some(text) = frame else {
                    logger.warn("Connection to Lares4 panel lost");
                    let _ = advance(&connection, ConnectionState::Closed);
                    break;
                };
                let frame = match InboundFrame::parse(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Ignoring unreadable frame: {}", e);
                        continue;
                    }
                };
                // release the lock before notifying subscribers
                let changes = state.write().await.apply_frame(&frame, &receiver);
                for change in changes {
                    log_change(&change, &*logger);
                    channels.publish(change);
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    debug!("Update listener shutting down");
                    break;
                }
            }
        }
    }
}

fn log_change(change: &ChangeEvent, logger: &dyn Logger) {
    let line = match change {
        ChangeEvent::Output(c) => c.status.to_string(),
        ChangeEvent::System(c) => c.status.to_string(),
        ChangeEvent::Sensor(c) => c.status.to_string(),
        ChangeEvent::Temperature(c) => c.status.to_string(),
    };
    logger.info(&line);
}
