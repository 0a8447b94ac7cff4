//! Operations: batches of calls and their content-derived ids.

use serde::{Deserialize, Serialize};
use village_crypto::hash_bytes;
use village_ledger::codec;
use village_types::{Address, Amount, Hash32, OperationId, Timestamp};

/// Ready-timestamp marker for executed operations.
pub const DONE_TIMESTAMP: Timestamp = Timestamp::new(1);

/// One raw call: target, attached value, calldata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub value: Amount,
    pub data: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: Amount, data: Vec<u8>) -> Self {
        Self {
            target,
            value,
            data,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    Unset,
    Waiting,
    Ready,
    Done,
}

impl OperationState {
    /// Classify an operation from its stored ready timestamp.
    pub fn of(ready_at: Option<Timestamp>, now: Timestamp) -> Self {
        match ready_at {
            None => Self::Unset,
            Some(t) if t == DONE_TIMESTAMP => Self::Done,
            Some(t) if t > now => Self::Waiting,
            Some(_) => Self::Ready,
        }
    }
}

/// Id of a single-call operation.
pub fn hash_operation(call: &Call, predecessor: &OperationId, salt: &Hash32) -> OperationId {
    hash_bytes(&codec::encode(&(call, predecessor, salt)))
}

/// Id of a batch operation.
pub fn hash_operation_batch(calls: &[Call], predecessor: &OperationId, salt: &Hash32) -> OperationId {
    hash_bytes(&codec::encode(&(calls, predecessor, salt)))
}
