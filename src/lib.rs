pub mod broadcast;
pub mod config;
pub mod schedule;
pub mod service;

use std::path::Path;
use std::sync::Arc;

use broadcast::{SessionId, ViewerSession};
use config::Settings;
use schedule::{FileWatcher, RefreshEvent, ScheduleError, SpreadsheetHandle};
use service::DisplayService;
use tokio::sync::mpsc;

const DEFAULT_LOG_FILTER: &str = "weekboard=info,weekboard_lib=info";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();
}

/// A running display engine: the service plus the watcher feeding it
pub struct Engine {
    service: Arc<DisplayService>,
    watcher: FileWatcher,
}

impl Engine {
    /// Load the most recent upload and start watching the storage directory.
    /// Must be called from within a tokio runtime.
    pub async fn start(settings: Settings) -> Result<Self, ScheduleError> {
        let service = Arc::new(DisplayService::new(settings)?);

        if let Err(e) = service.load_most_recent().await {
            tracing::warn!(error = %e, "could not load the most recent upload");
        }

        // Weak so the watcher task never keeps the service alive on its own
        let target = Arc::downgrade(&service);
        let settings = service.settings();
        let watcher = FileWatcher::start(
            &settings.storage_dir,
            settings.allowed_extensions.clone(),
            settings.debounce(),
            move |path| {
                let target = target.clone();
                async move {
                    if let Some(service) = target.upgrade() {
                        service.apply_change(path).await;
                    }
                }
            },
        )?;

        Ok(Engine { service, watcher })
    }

    pub fn service(&self) -> &Arc<DisplayService> {
        &self.service
    }

    /// Activate a file anywhere on disk and keep watching it
    pub async fn activate_file(&self, path: &Path) -> Result<Arc<SpreadsheetHandle>, ScheduleError> {
        let handle = self.service.activate_file(path).await?;
        self.watcher.follow(handle.path())?;
        Ok(handle)
    }

    /// Register a new viewer and hand back its id and refresh stream
    pub async fn connect_viewer(&self) -> (SessionId, mpsc::Receiver<RefreshEvent>) {
        let (session, rx) = ViewerSession::channel(self.service.settings().session_buffer);
        let id = self.service.broadcaster().register(session).await;
        (id, rx)
    }

    /// Forget a viewer whose connection closed
    pub async fn disconnect_viewer(&self, id: SessionId) -> bool {
        self.service.broadcaster().unregister(id).await
    }
}
