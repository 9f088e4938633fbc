//! Connection monitor with persistent connection and automatic reconnection

use crate::protocol;
use crate::transport::TcpClient;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for the gamepad link, fixed at construction.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Target host
    pub host: String,
    /// Target port
    pub port: u16,
    /// Timeout for a single connect attempt
    pub connect_timeout: Duration,
    /// Interval between heartbeats on a healthy connection
    pub heartbeat_interval: Duration,
    /// Reconnection delay (initial)
    pub initial_backoff: Duration,
    /// Maximum reconnection delay
    pub max_backoff: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.50".into(),
            port: 8080,
            connect_timeout: Duration::from_millis(3000),
            heartbeat_interval: Duration::from_millis(5000),
            initial_backoff: Duration::from_millis(2000),
            max_backoff: Duration::from_millis(30000),
        }
    }
}

/// The running supervisory loop. At most one exists per monitor.
struct MonitorTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Supervises the transport client across its full lifetime.
///
/// While started, a background task drives the client through a
/// connect -> heartbeat -> detect-failure -> backoff-reconnect cycle and
/// publishes its current belief about connectivity through a watch channel.
/// Ad-hoc sends go through the same serialized client; a failed send flips
/// the published signal but leaves closing the transport to the loop.
pub struct ConnectionMonitor {
    config: LinkConfig,
    transport: Arc<Mutex<TcpClient>>,
    connected: Arc<watch::Sender<bool>>,
    task: Mutex<Option<MonitorTask>>,
}

impl ConnectionMonitor {
    /// Create a monitor for the given endpoint. No connection is attempted
    /// until [`start`](Self::start) is called.
    pub fn new(config: LinkConfig) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            config,
            transport: Arc::new(Mutex::new(TcpClient::new())),
            connected: Arc::new(connected),
            task: Mutex::new(None),
        }
    }

    /// Start the supervisory loop. No-op if it is already running.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("monitor already running");
            return;
        }

        info!("starting link monitor for {}:{}", self.config.host, self.config.port);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.config.clone();
        let transport = self.transport.clone();
        let connected = self.connected.clone();
        let handle = tokio::spawn(async move {
            monitor_loop(config, transport, connected, shutdown_rx).await;
        });

        *task = Some(MonitorTask {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Stop the supervisory loop, close any live session and publish `false`.
    ///
    /// Shutdown is observed at the loop's sleep points, never mid-write.
    /// Safe to call when not running; the close and publish still happen.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            let _ = task.shutdown.send(true);
            let _ = task.handle.await;
            info!("link monitor stopped");
        }

        self.transport.lock().await.close().await;
        self.connected.send_replace(false);
    }

    /// Send one line to the peer, outside the loop's heartbeat schedule.
    ///
    /// On failure the connectivity signal flips to `false` immediately, but
    /// the transport is left open: the loop's next connectivity check or
    /// heartbeat finalizes the disconnect and drives reconnection. Backoff
    /// state is never touched from this path.
    pub async fn send_message(&self, message: &str) -> Result<()> {
        let result = self.transport.lock().await.send(message).await;
        if let Err(e) = &result {
            debug!("send failed, marking disconnected: {e:#}");
            self.connected.send_replace(false);
        }
        result
    }

    /// Subscribe to the connectivity signal: current value plus change
    /// notifications.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    /// Current value of the connectivity signal. This is the monitor's best
    /// belief, lagging real connectivity by at most one heartbeat interval.
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Whether the supervisory loop is active. Lets the host decide whether
    /// to offer "connect" or "disconnect" next.
    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        // Host teardown without an explicit stop(): don't leave the loop
        // running against a dead monitor.
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

/// Outcome of one supervisory cycle, carrying the backoff state forward.
enum Cycle {
    /// Connection healthy; next heartbeat after the regular interval.
    Healthy { backoff: Duration },
    /// Connect or heartbeat failed; wait `delay` before the next attempt.
    Failed { delay: Duration, backoff: Duration },
}

async fn monitor_loop(
    config: LinkConfig,
    transport: Arc<Mutex<TcpClient>>,
    connected: Arc<watch::Sender<bool>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = config.initial_backoff;

    loop {
        if *shutdown.borrow() {
            break;
        }

        // Each cycle runs in its own task so that a panic inside it cannot
        // kill the monitor; the loop only ever exits on shutdown.
        let cycle = tokio::spawn(run_cycle(
            config.clone(),
            transport.clone(),
            connected.clone(),
            backoff,
        ));

        match cycle.await {
            Ok(Cycle::Healthy { backoff: next }) => {
                backoff = next;
                if wait(config.heartbeat_interval, &mut shutdown).await {
                    break;
                }
            }
            Ok(Cycle::Failed { delay, backoff: next }) => {
                backoff = next;
                if wait(delay, &mut shutdown).await {
                    break;
                }
            }
            Err(e) => {
                // A cycle that died outside the structured connect/heartbeat
                // handling: mark down, drop the session and retry after the
                // fixed initial delay instead of the doubling backoff.
                warn!("monitor cycle failed: {e}");
                connected.send_replace(false);
                transport.lock().await.close().await;
                if wait(config.initial_backoff, &mut shutdown).await {
                    break;
                }
            }
        }
    }

    debug!("monitor loop exited");
}

/// One iteration of the supervisory cycle: reconnect if needed, then
/// heartbeat. Backoff resets on every successful connect and doubles
/// (capped) on failure; the delay reported with a failure is the
/// pre-doubling value.
async fn run_cycle(
    config: LinkConfig,
    transport: Arc<Mutex<TcpClient>>,
    connected: Arc<watch::Sender<bool>>,
    mut backoff: Duration,
) -> Cycle {
    let mut client = transport.lock().await;

    if !client.is_connected() {
        debug!("attempting connect to {}:{}", config.host, config.port);
        match client
            .connect(&config.host, config.port, config.connect_timeout)
            .await
        {
            Ok(()) => {
                info!("connected to {}:{}", config.host, config.port);
                connected.send_replace(true);
                backoff = config.initial_backoff;
            }
            Err(e) => {
                debug!("connect failed, will retry in {:?}: {e:#}", backoff);
                connected.send_replace(false);
                return Cycle::Failed {
                    delay: backoff,
                    backoff: next_backoff(backoff, config.max_backoff),
                };
            }
        }
    }

    match client.send(protocol::HEARTBEAT).await {
        Ok(()) => {
            connected.send_replace(true);
            Cycle::Healthy { backoff }
        }
        Err(e) => {
            warn!("heartbeat failed, marking disconnected: {e:#}");
            connected.send_replace(false);
            client.close().await;
            Cycle::Failed {
                delay: backoff,
                backoff: next_backoff(backoff, config.max_backoff),
            }
        }
    }
}

/// Doubling backoff, capped: `min(current * 2, max)`.
fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

/// Sleep for `delay`, waking early on shutdown. Returns `true` when the
/// loop should exit.
async fn wait(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = shutdown.changed() => true,
        _ = sleep(delay) => false,
    }
}
