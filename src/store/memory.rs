use crate::models::{NewProperty, Property, PropertyFilter};
use crate::store::PropertyStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

/// Store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Property>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Property>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub async fn snapshot(&self) -> Vec<Property> {
        self.rows.lock().await.clone()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Drop the row with `id`, used to undo an insert whose write-back failed
    pub(crate) async fn remove(&self, id: i64) {
        self.rows.lock().await.retain(|p| p.id != id);
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        let rows = self.rows.lock().await;
        let mut matched: Vec<Property> = rows.iter().filter(|p| filter.matches(p)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matched)
    }

    async fn create_property(&self, property: NewProperty) -> Result<Property> {
        let mut rows = self.rows.lock().await;
        let id = rows.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let row = Property::from_new(id, property, Utc::now());
        rows.push(row.clone());
        Ok(row)
    }
}
