//! Event logs emitted by contracts, and the subscriber bus.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use village_types::{Address, BlockNumber};

use crate::codec;

/// A typed event a contract can emit.
pub trait EventData: Serialize + DeserializeOwned {
    /// Event name, e.g. `"ProposalCreated"`.
    const NAME: &'static str;
}

/// A raw log entry, as recorded in receipts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub emitter: Address,
    pub block: BlockNumber,
    pub name: String,
    pub data: Vec<u8>,
}

impl Log {
    /// Decode this log as `E` if the names match.
    pub fn decode<E: EventData>(&self) -> Option<E> {
        if self.name != E::NAME {
            return None;
        }
        codec::decode(&self.data).ok()
    }
}

/// Synchronous fan-out bus for committed logs.
///
/// Listeners only ever see logs from successful transactions, invoked inline
/// after the block is sealed.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&Log) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&Log) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, log: &Log) {
        for listener in &self.listeners {
            listener(log);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
