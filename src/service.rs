use crate::config::{ConfigStore, Configuration};
use crate::control::{ControlRequest, REQUEST_CHANNEL_CAPACITY};
use crate::error::{BridgeError, Result};
use crate::events::{SessionEvent, EVENT_CHANNEL_CAPACITY};
use crate::lifecycle::{Collaborators, LifecycleManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

const STOP_GRACE: Duration = Duration::from_millis(500);
const CONFIG_CHANNEL_CAPACITY: usize = 8;

/// Running bridge between one amplifier and its control surfaces
///
/// All device events, host requests and settings changes are handled in order
/// by a single background task, which owns the device session and the
/// registered controls.
///
/// # Example
///
/// ```no_run
/// use moon_bridge::{Bridge, Collaborators, JsonConfigStore};
/// use std::sync::Arc;
///
/// # async fn run(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(JsonConfigStore::new("settings.json"));
/// let mut bridge = Bridge::load(store, collaborators)?;
///
/// // ... later, when the user saves new settings
/// let mut config = bridge.configuration();
/// config.transport_identifier = "/dev/ttyUSB0".to_string();
/// bridge.save_settings(config).await?;
///
/// bridge.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Bridge {
    config: Configuration,
    config_tx: mpsc::Sender<Configuration>,
    store: Option<Arc<dyn ConfigStore>>,
    stop_tx: Option<broadcast::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Bridge {
    /// Start the bridge with `config`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: Configuration, collaborators: Collaborators) -> Self {
        Self::spawn(config, collaborators, None)
    }

    /// Start the bridge with the configuration saved in `store`, or defaults
    pub fn load(store: Arc<dyn ConfigStore>, collaborators: Collaborators) -> Result<Self> {
        let config = match store.load()? {
            Some(config) => config,
            None => {
                tracing::info!("No saved settings, using defaults");
                Configuration::default()
            }
        };
        Ok(Self::spawn(config, collaborators, Some(store)))
    }

    /// The configuration most recently handed to the bridge
    pub fn configuration(&self) -> Configuration {
        self.config.clone()
    }

    /// Persist `config` and apply it
    ///
    /// A changed transport identifier restarts the device session; other
    /// changes take effect on the next request.
    pub async fn save_settings(&mut self, config: Configuration) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&config)?;
        }
        self.config_tx
            .send(config.clone())
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;
        self.config = config;
        Ok(())
    }

    /// Stop the bridge, tearing down the controls and the device session
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if tokio::time::timeout(STOP_GRACE, handle).await.is_err() {
                tracing::warn!("Bridge did not stop within {:?}", STOP_GRACE);
            }
        }
    }

    fn spawn(
        config: Configuration,
        collaborators: Collaborators,
        store: Option<Arc<dyn ConfigStore>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (config_tx, config_rx) = mpsc::channel(CONFIG_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let manager = LifecycleManager::new(config.clone(), collaborators, events_tx, requests_tx);
        let handle = tokio::spawn(run_dispatch_loop(
            manager,
            config.clone(),
            events_rx,
            requests_rx,
            config_rx,
            stop_rx,
        ));

        Self {
            config,
            config_tx,
            store,
            stop_tx: Some(stop_tx),
            task_handle: Some(handle),
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn run_dispatch_loop(
    mut manager: LifecycleManager,
    initial: Configuration,
    mut events_rx: mpsc::Receiver<SessionEvent>,
    mut requests_rx: mpsc::Receiver<ControlRequest>,
    mut config_rx: mpsc::Receiver<Configuration>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    tracing::info!("Bridge started");
    if let Err(e) = manager.apply_configuration(initial) {
        tracing::warn!("Initial setup failed: {}", e);
    }

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                tracing::info!("Bridge stopped by user");
                break;
            }
            Some(event) = events_rx.recv() => manager.handle_event(event),
            Some(request) = requests_rx.recv() => manager.handle_request(request),
            Some(config) = config_rx.recv() => {
                tracing::info!(
                    "Settings saved (serial port {:?}, source {})",
                    config.transport_identifier,
                    config.default_source
                );
                if let Err(e) = manager.update_configuration(config) {
                    tracing::warn!("Settings not applied: {}", e);
                }
            }
            else => break,
        }
    }

    manager.shutdown();
    tracing::info!("Bridge stopped");
}
