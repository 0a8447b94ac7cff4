//! The ledger: contracts, balances, clock and committed logs.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use village_crypto::contract_address;
use village_types::{Address, Amount, Timestamp};

use crate::clock::{BlockEnv, ChainClock};
use crate::codec;
use crate::context::{dispatch, install, Frame, WorldState};
use crate::contract::{downcast, Contract};
use crate::error::CallError;
use crate::event::{EventBus, EventData, Log};

/// Outcome of a mined transaction.
#[derive(Clone, Debug)]
pub struct Receipt {
    pub block: BlockEnv,
    pub from: Address,
    pub to: Address,
    pub logs: Vec<Log>,
    pub return_data: Vec<u8>,
}

impl Receipt {
    /// First event of type `E` in this receipt.
    pub fn event<E: EventData>(&self) -> Option<E> {
        self.logs.iter().find_map(|log| log.decode::<E>())
    }

    /// Every event of type `E` in this receipt, in emission order.
    pub fn events<E: EventData>(&self) -> Vec<E> {
        self.logs.iter().filter_map(|log| log.decode::<E>()).collect()
    }

    /// Decode the call's return data.
    pub fn decode_return<T: DeserializeOwned>(&self) -> Result<T, CallError> {
        codec::decode(&self.return_data)
    }
}

/// Address and receipt of a freshly deployed contract.
#[derive(Clone, Debug)]
pub struct Deployed {
    pub address: Address,
    pub receipt: Receipt,
}

/// A single, totally ordered ledger.
pub struct Ledger {
    clock: ChainClock,
    state: WorldState,
    nonces: BTreeMap<Address, u64>,
    logs: Vec<Log>,
    bus: EventBus,
}

impl Ledger {
    pub fn new(genesis_time: Timestamp) -> Self {
        Self {
            clock: ChainClock::new(genesis_time),
            state: WorldState::default(),
            nonces: BTreeMap::new(),
            logs: Vec::new(),
            bus: EventBus::new(),
        }
    }

    /// The latest mined block.
    pub fn block(&self) -> BlockEnv {
        self.clock.current()
    }

    /// Mine `count` empty blocks (`moveBlocks`).
    pub fn mine(&mut self, count: u64) {
        self.clock.mine(count);
    }

    /// Stretch the gap before the next block by `secs`.
    pub fn increase_time(&mut self, secs: u64) {
        self.clock.increase_time(secs);
    }

    /// Advance time by `secs` and mine one block (`moveTime`).
    pub fn move_time(&mut self, secs: u64) {
        self.clock.increase_time(secs);
        self.clock.mine(1);
    }

    /// Credit native currency out of thin air (pre-funded dev accounts).
    /// Saturates at the largest representable balance.
    pub fn fund(&mut self, account: Address, amount: Amount) {
        let balance = self.state.balance(&account).saturating_add(amount);
        self.state.balances.insert(account, balance);
    }

    pub fn balance_of(&self, account: Address) -> Amount {
        self.state.balance(&account)
    }

    /// Number of transactions mined from `account`.
    pub fn nonce(&self, account: Address) -> u64 {
        self.nonces.get(&account).copied().unwrap_or(0)
    }

    /// Address the next deployment from `deployer` will land at.
    pub fn next_contract_address(&self, deployer: Address) -> Address {
        contract_address(&deployer, self.nonce(deployer))
    }

    pub fn is_contract(&self, address: Address) -> bool {
        self.state.contracts.contains_key(&address)
    }

    /// Typed read access to a deployed contract.
    pub fn contract<T: Contract>(&self, address: Address) -> Result<&T, CallError> {
        let contract = self
            .state
            .contracts
            .get(&address)
            .ok_or(CallError::NoContract(address))?;
        downcast::<T>(contract.as_ref(), address)
    }

    /// Every committed log, oldest first.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Register a listener for logs of future successful transactions.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&Log) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    /// Deploy `contract` from `deployer` in a new block.
    pub fn deploy<C: Contract>(&mut self, deployer: Address, contract: C) -> Result<Deployed, CallError> {
        let name = contract.name();
        let address = self.next_contract_address(deployer);
        let block = self.clock.pending();
        let mut logs = Vec::new();

        if let Err(e) = install(
            &mut self.state,
            &mut logs,
            block,
            deployer,
            address,
            Box::new(contract),
        ) {
            warn!(contract = name, error = %e, "deployment reverted");
            return Err(e);
        }

        debug!(contract = name, %address, block = %block.number, "contract deployed");
        let receipt = self.seal(block, deployer, address, logs, Vec::new());
        Ok(Deployed { address, receipt })
    }

    /// Send a transaction in a new block. Either every effect lands or none does.
    pub fn transact(
        &mut self,
        from: Address,
        to: Address,
        value: Amount,
        calldata: &[u8],
    ) -> Result<Receipt, CallError> {
        let block = self.clock.pending();
        let mut logs = Vec::new();
        let frame = Frame {
            sender: from,
            target: to,
            value,
            depth: 0,
        };

        match dispatch(&mut self.state, &mut logs, block, frame, calldata) {
            Ok(return_data) => {
                debug!(%from, %to, block = %block.number, logs = logs.len(), "transaction mined");
                Ok(self.seal(block, from, to, logs, return_data))
            }
            Err(e) => {
                debug!(%from, %to, error = %e, "transaction reverted");
                Err(e)
            }
        }
    }

    fn seal(
        &mut self,
        block: BlockEnv,
        from: Address,
        to: Address,
        logs: Vec<Log>,
        return_data: Vec<u8>,
    ) -> Receipt {
        self.clock.commit(block);
        *self.nonces.entry(from).or_insert(0) += 1;
        for log in &logs {
            self.bus.emit(log);
        }
        self.logs.extend(logs.iter().cloned());
        Receipt {
            block,
            from,
            to,
            logs,
            return_data,
        }
    }
}
