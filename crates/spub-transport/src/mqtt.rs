//! MQTT transport adapter (rumqttc).
//!
//! # Lifecycle
//!
//! 1. [`MqttPublisher::connect`] polls the event loop until the broker's
//!    CONNACK arrives. A refusal, a network failure or a timeout is returned
//!    as a [`TransportError`]; the caller treats it as fatal.
//! 2. The event loop then moves to a background task that keeps the session
//!    alive, reconnects with [`Backoff`] after failures, and reports its
//!    [`ConnectionState`] on a watch channel.
//! 3. [`MqttPublisher::shutdown`] sends DISCONNECT and joins the task.
//!
//! Publishing never waits on the broker: messages go into the client's
//! request queue with `try_publish`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::publisher::{Publisher, TransportError};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Broker connection parameters. Built by the daemon from its config.
#[derive(Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    /// 0, 1 or 2. Anything above 2 is treated as 2.
    pub qos: u8,
    pub credentials: Option<(String, String)>,
    pub connect_timeout: Duration,
    /// Capacity of the client's outgoing request queue.
    pub request_capacity: usize,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

impl fmt::Debug for MqttSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("keep_alive", &self.keep_alive)
            .field("qos", &self.qos)
            .field(
                "credentials",
                &self.credentials.as_ref().map(|(user, _)| (user, "<REDACTED>")),
            )
            .field("connect_timeout", &self.connect_timeout)
            .field("request_capacity", &self.request_capacity)
            .field("reconnect_initial", &self.reconnect_initial)
            .field("reconnect_max", &self.reconnect_max)
            .finish()
    }
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "solar-publisher".to_string(),
            keep_alive: Duration::from_secs(60),
            qos: 1,
            credentials: None,
            connect_timeout: Duration::from_secs(10),
            request_capacity: 100,
            reconnect_initial: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(60),
        }
    }
}

impl MqttSettings {
    fn qos(&self) -> QoS {
        match self.qos {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => QoS::ExactlyOnce,
        }
    }

    fn options(&self) -> MqttOptions {
        let mut opts = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        // rumqttc rejects keep-alives below 5s.
        opts.set_keep_alive(self.keep_alive.max(Duration::from_secs(5)));
        if let Some((user, pass)) = &self.credentials {
            opts.set_credentials(user.clone(), pass.clone());
        }
        opts
    }
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Broker session state as seen by the background event loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32, delay_ms: u64 },
    Disconnected,
}

fn return_code(code: ConnectReturnCode) -> u8 {
    match code {
        ConnectReturnCode::Success => 0,
        ConnectReturnCode::RefusedProtocolVersion => 1,
        ConnectReturnCode::BadClientId => 2,
        ConnectReturnCode::ServiceUnavailable => 3,
        ConnectReturnCode::BadUserNamePassword => 4,
        ConnectReturnCode::NotAuthorized => 5,
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Connected MQTT client plus its background event-loop task.
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
    closing: Arc<AtomicBool>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MqttPublisher {
    /// Connect and wait for the broker's acknowledgement.
    pub async fn connect(settings: &MqttSettings) -> Result<Self, TransportError> {
        let (client, mut eventloop) =
            AsyncClient::new(settings.options(), settings.request_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let secs = settings.connect_timeout.as_secs();
        tokio::time::timeout(settings.connect_timeout, await_connack(&mut eventloop))
            .await
            .map_err(|_| TransportError::ConnectTimeout { secs })??;

        info!(
            host = %settings.host,
            port = settings.port,
            client_id = %settings.client_id,
            "broker connected"
        );
        state_tx.send_replace(ConnectionState::Connected);

        let closing = Arc::new(AtomicBool::new(false));
        let backoff = Backoff::new(settings.reconnect_initial, settings.reconnect_max);
        let task = tokio::spawn(drive_event_loop(
            eventloop,
            state_tx,
            backoff,
            Arc::clone(&closing),
        ));

        Ok(Self {
            client,
            qos: settings.qos(),
            closing,
            state_rx,
            task: Mutex::new(Some(task)),
        })
    }

    /// Watch handle on the session state (for status reporting).
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Send DISCONNECT (flushing queued publications first) and join the
    /// event-loop task. Safe to call more than once.
    pub async fn shutdown(&self, grace: Duration) {
        self.closing.store(true, Ordering::SeqCst);
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "disconnect request not queued");
        }
        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        match tokio::time::timeout(grace, task).await {
            Ok(_) => info!("broker disconnected"),
            Err(_) => warn!(grace_ms = grace.as_millis() as u64, "event loop did not stop in time"),
        }
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), TransportError> {
        self.client
            .try_publish(topic, self.qos, retained, payload.as_bytes().to_vec())
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                detail: e.to_string(),
            })
    }
}

async fn await_connack(eventloop: &mut EventLoop) -> Result<(), TransportError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return match return_code(ack.code) {
                    0 => Ok(()),
                    code => Err(TransportError::ConnectRefused { code }),
                };
            }
            Ok(_) => continue,
            Err(ConnectionError::ConnectionRefused(code)) => {
                return Err(TransportError::ConnectRefused {
                    code: return_code(code),
                })
            }
            Err(e) => {
                return Err(TransportError::Connect {
                    detail: e.to_string(),
                })
            }
        }
    }
}

/// Own the event loop for the rest of the process: keep-alive, outgoing
/// queue, and reconnects. Exits after DISCONNECT or when the client is gone.
async fn drive_event_loop(
    mut eventloop: EventLoop,
    state_tx: watch::Sender<ConnectionState>,
    mut backoff: Backoff,
    closing: Arc<AtomicBool>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if backoff.attempt() > 0 {
                    info!(attempts = backoff.attempt(), "broker reconnected");
                }
                backoff.reset();
                state_tx.send_replace(ConnectionState::Connected);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                state_tx.send_replace(ConnectionState::Disconnected);
                break;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                state_tx.send_replace(ConnectionState::Disconnected);
                break;
            }
            Err(e) => {
                if closing.load(Ordering::SeqCst) {
                    state_tx.send_replace(ConnectionState::Disconnected);
                    break;
                }
                let delay = backoff.next_delay();
                warn!(
                    error = %e,
                    attempt = backoff.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "broker connection lost; reconnecting"
                );
                state_tx.send_replace(ConnectionState::Reconnecting {
                    attempt: backoff.attempt(),
                    delay_ms: delay.as_millis() as u64,
                });
                tokio::time::sleep(delay).await;
            }
        }
    }
}
