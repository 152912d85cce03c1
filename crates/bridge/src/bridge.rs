use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    botplus_channels::{ConnectionStatus, EventDispatcher},
    botplus_config::BridgeConfig,
    tokio::{net::TcpListener, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{error, info},
};

use crate::{
    Error, Result,
    server::{BridgeState, build_bridge_app},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    Stopped,
    Starting,
    Listening,
}

#[derive(Default)]
struct Running {
    local_addr: Option<SocketAddr>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// The vote webhook server and its lifecycle.
pub struct EventBridge {
    host: String,
    port: u16,
    state: Arc<BridgeState>,
    phase: Mutex<BridgePhase>,
    running: Mutex<Running>,
}

impl EventBridge {
    pub fn new(
        config: &BridgeConfig,
        dispatcher: EventDispatcher,
        status: Arc<dyn ConnectionStatus>,
    ) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            state: Arc::new(BridgeState {
                dispatcher,
                status,
                vote_secret: config.vote_secret.clone(),
            }),
            phase: Mutex::new(BridgePhase::Stopped),
            running: Mutex::new(Running::default()),
        }
    }

    pub fn phase(&self) -> BridgePhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bound address while listening (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .local_addr
    }

    fn set_phase(&self, phase: BridgePhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    /// Bind and start serving in a background task.
    pub async fn start(&self) -> Result<SocketAddr> {
        {
            let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
            if *phase != BridgePhase::Stopped {
                return Err(Error::AlreadyRunning);
            }
            *phase = BridgePhase::Starting;
        }

        let addr = format!("{}:{}", self.host, self.port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.set_phase(BridgePhase::Stopped);
                return Err(Error::bind(addr, e));
            },
        };
        let local_addr = listener.local_addr().map_err(|e| {
            self.set_phase(BridgePhase::Stopped);
            Error::bind(addr.clone(), e)
        })?;

        let app = build_bridge_app(Arc::clone(&self.state));
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone().cancelled_owned();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "bridge server failed");
            }
        });

        *self.running.lock().unwrap_or_else(|e| e.into_inner()) = Running {
            local_addr: Some(local_addr),
            cancel: Some(cancel),
            task: Some(task),
        };
        self.set_phase(BridgePhase::Listening);
        info!(addr = %local_addr, "vote bridge listening");
        Ok(local_addr)
    }

    /// Stop serving and wait for the server task to finish.
    pub async fn stop(&self) {
        let Running { cancel, task, .. } =
            std::mem::take(&mut *self.running.lock().unwrap_or_else(|e| e.into_inner()));
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(task) = task {
            let _ = task.await;
            info!("vote bridge stopped");
        }
        self.set_phase(BridgePhase::Stopped);
    }
}
