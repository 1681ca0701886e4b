use std::{collections::HashMap, fmt};

use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use super::{TrafficLog, TrafficLogPatch};

/// No traffic log is stored under the id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("traffic log {id} not found")]
pub struct TrafficLogNotFound {
    /// The id that was looked up
    pub id: Uuid,
}

/// Storage for traffic logs
///
/// Implementations assign ids on creation. Every operation on an unknown id
/// fails with [`TrafficLogNotFound`].
pub trait TrafficLogRepository: fmt::Debug + Send + Sync + 'static {
    /// Stores a new log and returns its id
    fn create(&self, log: TrafficLog) -> Uuid;

    /// Fetches a stored log
    fn get(&self, id: Uuid) -> Result<TrafficLog, TrafficLogNotFound>;

    /// Applies a patch and returns the updated log
    fn update(&self, id: Uuid, patch: TrafficLogPatch) -> Result<TrafficLog, TrafficLogNotFound>;

    /// Removes a log, returning what was stored
    fn delete(&self, id: Uuid) -> Result<TrafficLog, TrafficLogNotFound>;
}

/// A [`TrafficLogRepository`] kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryTrafficLogs {
    logs: RwLock<HashMap<Uuid, TrafficLog>>,
}

impl InMemoryTrafficLogs {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored logs
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Whether the store holds no logs
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}

impl TrafficLogRepository for InMemoryTrafficLogs {
    fn create(&self, log: TrafficLog) -> Uuid {
        let id = Uuid::new_v4();
        self.logs.write().insert(id, log);
        id
    }

    fn get(&self, id: Uuid) -> Result<TrafficLog, TrafficLogNotFound> {
        self.logs
            .read()
            .get(&id)
            .cloned()
            .ok_or(TrafficLogNotFound { id })
    }

    fn update(&self, id: Uuid, patch: TrafficLogPatch) -> Result<TrafficLog, TrafficLogNotFound> {
        let mut logs = self.logs.write();
        let log = logs.get_mut(&id).ok_or(TrafficLogNotFound { id })?;
        log.apply(patch);
        Ok(log.clone())
    }

    fn delete(&self, id: Uuid) -> Result<TrafficLog, TrafficLogNotFound> {
        self.logs
            .write()
            .remove(&id)
            .ok_or(TrafficLogNotFound { id })
    }
}
