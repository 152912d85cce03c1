use std::sync::{Arc, Mutex};

use {async_trait::async_trait, botplus_modules::Module};

use crate::poster::{PosterHandle, StatsPoster};

pub const POSTER_MODULE: &str = "stats-poster";

/// Runs a [`StatsPoster`] loop while attached.
pub struct PosterModule {
    poster: Arc<StatsPoster>,
    handle: Mutex<Option<PosterHandle>>,
}

impl PosterModule {
    pub fn new(poster: Arc<StatsPoster>) -> Self {
        Self {
            poster,
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(PosterHandle::is_running)
    }
}

#[async_trait]
impl Module for PosterModule {
    fn name(&self) -> &str {
        POSTER_MODULE
    }

    async fn on_attach(&self) -> anyhow::Result<()> {
        let handle = Arc::clone(&self.poster).start();
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    async fn on_detach(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}
