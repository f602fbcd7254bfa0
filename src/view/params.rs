use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::region::RegionLevel;

/// Externally-observable view parameters: enough to reconstruct the current
/// view from a reload or a shared link without replaying click history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub level: RegionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub round: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Persistence seam for view parameters, written on every drill-down, round,
/// or location change and read once on view entry.
pub trait ViewStore: Send {
    fn write(&mut self, params: &ViewParams) -> Result<()>;
    fn read(&self) -> Result<Option<ViewParams>>;
}

/// In-memory store holding the serialized form, like a browser location bar.
/// Clones share the same slot so callers can observe what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    serialized: Arc<Mutex<Option<String>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialized(&self) -> Option<String> {
        self.serialized.lock().expect("view store lock poisoned").clone()
    }
}

impl ViewStore for MemStore {
    fn write(&mut self, params: &ViewParams) -> Result<()> {
        let text = serde_json::to_string(params).context("failed to serialize view params")?;
        *self.serialized.lock().expect("view store lock poisoned") = Some(text);
        Ok(())
    }

    fn read(&self) -> Result<Option<ViewParams>> {
        self.serialized
            .lock()
            .expect("view store lock poisoned")
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("failed to parse persisted view params")
    }
}
