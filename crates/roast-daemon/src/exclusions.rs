use roast_common::ExcludedApp;
use roast_db::{ExclusionStore, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Apps that are never tracked. Lookups hit an in-memory set; changes are
/// written through to the store first.
pub struct ExclusionList {
    store: Arc<dyn ExclusionStore>,
    app_ids: RwLock<HashSet<String>>,
}

impl ExclusionList {
    pub fn empty(store: Arc<dyn ExclusionStore>) -> Self {
        Self { store, app_ids: RwLock::new(HashSet::new()) }
    }

    pub async fn load(store: Arc<dyn ExclusionStore>) -> Result<Self> {
        let list = Self::empty(store);
        list.reload().await?;
        Ok(list)
    }

    pub async fn reload(&self) -> Result<()> {
        let apps = self.store.excluded_apps().await?;
        let mut app_ids = self.app_ids.write().await;
        *app_ids = apps.into_iter().map(|app| app.app_id).collect();
        info!("Loaded {} excluded apps", app_ids.len());
        Ok(())
    }

    pub async fn is_excluded(&self, app_id: &str) -> bool {
        self.app_ids.read().await.contains(app_id)
    }

    pub async fn add(&self, app_id: &str, app_name: &str) -> Result<()> {
        self.store.add_excluded(&ExcludedApp::new(app_id, app_name)).await?;
        self.app_ids.write().await.insert(app_id.to_string());
        info!("Excluded app from tracking: {}", app_id);
        Ok(())
    }

    pub async fn remove(&self, app_id: &str) -> Result<bool> {
        let removed = self.store.remove_excluded(app_id).await?;
        self.app_ids.write().await.remove(app_id);
        if removed {
            info!("Resumed tracking app: {}", app_id);
        }
        Ok(removed)
    }

    pub async fn list(&self) -> Result<Vec<ExcludedApp>> {
        self.store.excluded_apps().await
    }
}
