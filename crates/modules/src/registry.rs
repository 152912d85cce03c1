use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use {
    botplus_channels::{EventDispatcher, ListenerId},
    serde::Serialize,
    tokio::sync::RwLock,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    module::{Module, ModuleOptions, ModuleStatus},
};

/// What the registry knows about one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRecord {
    pub name: String,
    pub disabled: bool,
    pub beta: bool,
    pub attached: bool,
}

impl ModuleRecord {
    pub fn status(&self) -> ModuleStatus {
        ModuleStatus::new(self.attached, self.beta)
    }
}

struct Entry {
    record: ModuleRecord,
    module: Arc<dyn Module>,
    listener_ids: Vec<ListenerId>,
}

/// Registry of every module the process knows about, keyed by name.
///
/// Module hooks run without any registry lock held, so `on_attach` and
/// `on_detach` may query the registry.
pub struct ModuleRegistry {
    dispatcher: EventDispatcher,
    entries: RwLock<BTreeMap<String, Entry>>,
    /// Names whose registration is in progress.
    // std Mutex: never held across an await point.
    pending: Mutex<BTreeSet<String>>,
}

impl ModuleRegistry {
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self {
            dispatcher,
            entries: RwLock::new(BTreeMap::new()),
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Instantiate a module and record it under its name.
    ///
    /// Enabled modules get their listeners attached and `on_attach` called;
    /// if that hook fails the listeners are detached again and nothing is
    /// recorded. Disabled modules are recorded without being attached.
    pub async fn register<M, F>(&self, factory: F, options: ModuleOptions) -> Result<ModuleStatus>
    where
        M: Module + 'static,
        F: FnOnce() -> M,
    {
        self.register_arc(Arc::new(factory()), options).await
    }

    /// [`register`](Self::register) for an already constructed module.
    pub async fn register_arc(
        &self,
        module: Arc<dyn Module>,
        options: ModuleOptions,
    ) -> Result<ModuleStatus> {
        let name = module.name().trim().to_string();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        {
            let entries = self.entries.read().await;
            if entries.contains_key(&name) || !self.pending().insert(name.clone()) {
                return Err(Error::duplicate(name));
            }
        }

        let mut listener_ids = Vec::new();
        if !options.disabled {
            for listener in module.listeners() {
                listener_ids.push(self.dispatcher.add_listener(listener).await);
            }
            if let Err(e) = module.on_attach().await {
                for id in listener_ids {
                    self.dispatcher.remove_listener(id).await;
                }
                self.pending().remove(&name);
                return Err(Error::attach(name, e));
            }
            if options.beta {
                info!(module = %name, "\"{name}\" is in beta status but it has been activated");
            }
        }

        let record = ModuleRecord {
            name: name.clone(),
            disabled: options.disabled,
            beta: options.beta,
            attached: !options.disabled,
        };
        let status = record.status();
        debug!(
            module = %name,
            status = %status,
            listeners = listener_ids.len(),
            "module registered"
        );
        let mut entries = self.entries.write().await;
        self.pending().remove(&name);
        entries.insert(name, Entry {
            record,
            module,
            listener_ids,
        });
        Ok(status)
    }

    /// Status of every known module, attached or not.
    pub async fn status(&self) -> BTreeMap<String, ModuleStatus> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(name, entry)| (name.clone(), entry.record.status()))
            .collect()
    }

    pub async fn records(&self) -> Vec<ModuleRecord> {
        self.entries
            .read()
            .await
            .values()
            .map(|e| e.record.clone())
            .collect()
    }

    pub async fn record(&self, name: &str) -> Option<ModuleRecord> {
        self.entries
            .read()
            .await
            .get(name)
            .map(|e| e.record.clone())
    }

    pub async fn is_attached(&self, name: &str) -> bool {
        self.entries
            .read()
            .await
            .get(name)
            .is_some_and(|e| e.record.attached)
    }

    /// Detach and forget a module. Returns false if the name is unknown.
    pub async fn remove(&self, name: &str) -> bool {
        let Some(entry) = self.entries.write().await.remove(name) else {
            return false;
        };
        if entry.record.attached {
            self.detach(name, &entry.module, entry.listener_ids).await;
        }
        info!(module = name, "module removed");
        true
    }

    /// Detach every attached module, keeping the records.
    pub async fn shutdown(&self) {
        let detached: Vec<_> = {
            let mut entries = self.entries.write().await;
            entries
                .iter_mut()
                .filter(|(_, entry)| entry.record.attached)
                .map(|(name, entry)| {
                    entry.record.attached = false;
                    let ids = std::mem::take(&mut entry.listener_ids);
                    (name.clone(), Arc::clone(&entry.module), ids)
                })
                .collect()
        };
        for (name, module, ids) in detached {
            self.detach(&name, &module, ids).await;
        }
    }

    async fn detach(&self, name: &str, module: &Arc<dyn Module>, listener_ids: Vec<ListenerId>) {
        for id in listener_ids {
            self.dispatcher.remove_listener(id).await;
        }
        module.on_detach().await;
        debug!(module = name, "module detached");
    }
}
