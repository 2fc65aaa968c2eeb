//! Shared utilities for integration testing: an in-memory chain.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::{keccak256, Address, Bytes, LogData, TxHash, U256};
use alloy::rpc::types::{Filter, Log};
use async_trait::async_trait;

use auction_sim::blockchain::{
    ChainClient, ChainError, ChainResult, TransferRequest, TxDetails, TxReceipt,
};
use auction_sim::events::{find_event, parse_abi};

pub const ETHER: u128 = 1_000_000_000_000_000_000;
pub const GWEI: u128 = 1_000_000_000;
pub const TRANSFER_GAS: u64 = 21_000;

pub const AUCTION_ABI: &str = r#"[
    {"type":"function","name":"bid","inputs":[],"outputs":[],"stateMutability":"payable"},
    {"type":"event","name":"BidSubmission","anonymous":false,"inputs":[
        {"name":"_sender","type":"address","indexed":true},
        {"name":"_amount","type":"uint256","indexed":false},
        {"name":"_missing_funds","type":"uint256","indexed":false}
    ]},
    {"type":"event","name":"AuctionEnded","anonymous":false,"inputs":[
        {"name":"_final_price","type":"uint256","indexed":false}
    ]}
]"#;

pub fn auction_abi() -> JsonAbi {
    parse_abi(AUCTION_ABI).unwrap()
}

pub fn bid_event() -> Event {
    find_event(&auction_abi(), "BidSubmission").unwrap().clone()
}

/// A `BidSubmission` log as the node would return it.
pub fn bid_log(contract: Address, sender: Address, amount: u64, block_number: u64) -> Log {
    let event = bid_event();
    let data = DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(amount), 256),
        DynSolValue::Uint(U256::ZERO, 256),
    ])
    .abi_encode_params();
    Log {
        inner: alloy::primitives::Log {
            address: contract,
            data: LogData::new_unchecked(
                vec![event.selector(), sender.into_word()],
                Bytes::from(data),
            ),
        },
        block_number: Some(block_number),
        ..Default::default()
    }
}

/// Poll `condition` until it holds or `limit` elapses.
pub async fn eventually<F, Fut>(limit: Duration, condition: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[derive(Default)]
struct MockState {
    balances: HashMap<Address, U256>,
    transactions: HashMap<TxHash, TxDetails>,
    receipts: HashMap<TxHash, TxReceipt>,
    /// Receipt lookups that still answer `None`.
    receipt_delay: u32,
    /// Every transfer uses its full gas limit.
    exhaust_gas: bool,
    sent: Vec<TransferRequest>,
    unlocked: Vec<(Address, String)>,
    next_tx: u64,
    history: Vec<Log>,
    pending: Vec<Log>,
    filters: HashSet<U256>,
    installed: Vec<Filter>,
    uninstalled: Vec<U256>,
    next_filter: u64,
    calls: Vec<&'static str>,
}

/// In-memory `ChainClient` with node-managed accounts and log filters.
pub struct MockChain {
    pub gas_price: u128,
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            gas_price: GWEI,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.state.lock().unwrap().balances.insert(address, balance);
        self
    }

    pub fn with_history(self, logs: Vec<Log>) -> Self {
        self.state.lock().unwrap().history = logs;
        self
    }

    pub fn exhaust_gas(&self) {
        self.state.lock().unwrap().exhaust_gas = true;
    }

    pub fn delay_receipts(&self, polls: u32) {
        self.state.lock().unwrap().receipt_delay = polls;
    }

    /// Register an already-submitted transaction.
    pub fn insert_transaction(&self, details: TxDetails, receipt: Option<TxReceipt>) {
        let mut state = self.state.lock().unwrap();
        if let Some(receipt) = receipt {
            state.receipts.insert(details.hash, receipt);
        }
        state.transactions.insert(details.hash, details);
    }

    pub fn insert_receipt(&self, receipt: TxReceipt) {
        self.state
            .lock()
            .unwrap()
            .receipts
            .insert(receipt.transaction_hash, receipt);
    }

    /// Make a log visible to the next filter poll.
    pub fn emit(&self, log: Log) {
        self.state.lock().unwrap().pending.push(log);
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<TransferRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn unlocked(&self) -> Vec<(Address, String)> {
        self.state.lock().unwrap().unlocked.clone()
    }

    pub fn installed_filters(&self) -> Vec<Filter> {
        self.state.lock().unwrap().installed.clone()
    }

    pub fn active_filters(&self) -> usize {
        self.state.lock().unwrap().filters.len()
    }

    pub fn uninstalled(&self) -> Vec<U256> {
        self.state.lock().unwrap().uninstalled.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, method: &'static str) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method);
        state
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_transaction(&self, tx_hash: TxHash) -> ChainResult<Option<TxDetails>> {
        let state = self.record("get_transaction");
        Ok(state.transactions.get(&tx_hash).cloned())
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TxReceipt>> {
        let mut state = self.record("get_transaction_receipt");
        if state.receipt_delay > 0 {
            state.receipt_delay -= 1;
            return Ok(None);
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }

    async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        let state = self.record("get_balance");
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn get_gas_price(&self) -> ChainResult<u128> {
        drop(self.record("get_gas_price"));
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, _request: TransferRequest) -> ChainResult<u64> {
        drop(self.record("estimate_gas"));
        Ok(TRANSFER_GAS)
    }

    async fn send_transaction(&self, request: TransferRequest) -> ChainResult<TxHash> {
        let mut guard = self.record("send_transaction");
        let state = &mut *guard;

        let gas_limit = request.gas_limit.unwrap_or(TRANSFER_GAS);
        let gas_price = U256::from(request.gas_price.unwrap_or(self.gas_price));
        let balance = state.balances.get(&request.from).copied().unwrap_or_default();
        if balance < request.value + U256::from(gas_limit) * gas_price {
            return Err(ChainError::Rpc("insufficient funds for gas * price + value".to_string()));
        }

        let gas_used = if state.exhaust_gas {
            gas_limit
        } else {
            TRANSFER_GAS.min(gas_limit)
        };
        let fee = U256::from(gas_used) * gas_price;
        let moved = if state.exhaust_gas { U256::ZERO } else { request.value };

        state.balances.insert(request.from, balance - fee - moved);
        *state.balances.entry(request.to).or_default() += moved;

        state.next_tx += 1;
        let tx_hash = keccak256(state.next_tx.to_be_bytes());
        state.transactions.insert(
            tx_hash,
            TxDetails {
                hash: tx_hash,
                to: Some(request.to),
                value: request.value,
                gas_limit,
            },
        );
        state.receipts.insert(
            tx_hash,
            TxReceipt {
                transaction_hash: tx_hash,
                block_number: Some(state.next_tx),
                gas_used,
                status: !state.exhaust_gas,
            },
        );
        state.sent.push(request);
        Ok(tx_hash)
    }

    async fn new_filter(&self, filter: &Filter) -> ChainResult<U256> {
        let mut state = self.record("new_filter");
        state.next_filter += 1;
        let id = U256::from(state.next_filter);
        state.filters.insert(id);
        state.installed.push(filter.clone());
        Ok(id)
    }

    async fn get_filter_logs(&self, filter_id: U256) -> ChainResult<Vec<Log>> {
        let state = self.record("get_filter_logs");
        if !state.filters.contains(&filter_id) {
            return Err(ChainError::Rpc("filter not found".to_string()));
        }
        Ok(state.history.clone())
    }

    async fn get_filter_changes(&self, filter_id: U256) -> ChainResult<Vec<Log>> {
        let mut state = self.record("get_filter_changes");
        if !state.filters.contains(&filter_id) {
            return Err(ChainError::Rpc("filter not found".to_string()));
        }
        Ok(std::mem::take(&mut state.pending))
    }

    async fn uninstall_filter(&self, filter_id: U256) -> ChainResult<bool> {
        let mut state = self.record("uninstall_filter");
        state.uninstalled.push(filter_id);
        Ok(state.filters.remove(&filter_id))
    }

    async fn unlock_account(
        &self,
        address: Address,
        passphrase: &str,
        _duration_secs: u64,
    ) -> ChainResult<bool> {
        let mut state = self.record("unlock_account");
        state.unlocked.push((address, passphrase.to_string()));
        Ok(true)
    }
}
