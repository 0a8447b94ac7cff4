//! Block-explorer source verification hook.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;
use village_types::{Address, NetworkId};

use crate::DeployError;

/// One contract submitted for verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationRequest {
    pub name: String,
    pub address: Address,
    pub args: Vec<String>,
    pub network: NetworkId,
}

/// Submits deployed contracts to a block explorer.
pub trait SourceVerifier: Send {
    fn verify(&mut self, request: &VerificationRequest) -> Result<(), DeployError>;
}

/// Records requests instead of contacting an explorer. Clones share the
/// same record.
#[derive(Clone, Debug, Default)]
pub struct RecordingVerifier {
    requests: Arc<Mutex<Vec<VerificationRequest>>>,
}

impl RecordingVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl SourceVerifier for RecordingVerifier {
    fn verify(&mut self, request: &VerificationRequest) -> Result<(), DeployError> {
        info!(
            contract = %request.name,
            address = %request.address,
            network = %request.network,
            "source verification requested"
        );
        self.requests
            .lock()
            .map_err(|_| DeployError::Verification {
                name: request.name.clone(),
                reason: "request log poisoned".into(),
            })?
            .push(request.clone());
        Ok(())
    }
}
