//! In-memory chain state for unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use ringsettle_types::constants::{BURN_BASE_PERCENTAGE, FEE_PERCENTAGE_BASE, MAX_RING_SIZE};
use ringsettle_types::{
    Address, Amount, BrokerInterceptor, BrokerRegistration, BrokerRegistry, BurnRate,
    BurnRateRegistry, CancellationLedger, CollaboratorError, Context, FeeLedger, FilledLedger,
    OrderBook, OrderHash, OrderHashRegistry, TokenLedger, TokenType, TradeAuthorization, Tranche,
};

pub fn token(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn context() -> Context {
    Context {
        block_number: 1,
        block_timestamp: 1_700_000_000,
        transaction_origin: token(0x0f),
        trade_delegate: token(0xde),
        fee_holder: token(0xfe),
        broker_registry: token(0xb0),
        order_registry: token(0xb1),
        order_book: token(0xb2),
        burn_rate_table: token(0xb3),
        base_token: token(0x1c),
        fee_percentage_base: FEE_PERCENTAGE_BASE,
        burn_base_percentage: BURN_BASE_PERCENTAGE,
        max_ring_size: MAX_RING_SIZE,
        max_orders_per_submission: 64,
        ring_index: 0,
    }
}

#[derive(Default)]
pub struct MockChain {
    pub registered: BTreeSet<(Address, OrderHash)>,
    pub submitted: BTreeSet<OrderHash>,
    pub filled: BTreeMap<OrderHash, Amount>,
    pub cancelled: BTreeSet<OrderHash>,
    pub cutoffs: BTreeMap<Address, u64>,
    pub pair_cutoffs: BTreeMap<(Address, Address, Address), u64>,
    pub brokers: BTreeMap<(Address, Address), BrokerRegistration>,
    /// `None` simulates a failing interceptor call.
    pub interceptor_decision: Option<Result<bool, CollaboratorError>>,
    pub interceptor_requests: RefCell<Vec<TradeAuthorization>>,
}

impl OrderHashRegistry for MockChain {
    fn is_order_hash_registered(&self, owner: &Address, hash: &OrderHash) -> bool {
        self.registered.contains(&(*owner, *hash))
    }
}

impl OrderBook for MockChain {
    fn is_order_submitted(&self, hash: &OrderHash) -> bool {
        self.submitted.contains(hash)
    }
}

impl BrokerRegistry for MockChain {
    fn broker_registration(&self, owner: &Address, broker: &Address) -> Option<BrokerRegistration> {
        self.brokers.get(&(*owner, *broker)).copied()
    }
}

impl BrokerInterceptor for MockChain {
    fn authorize_trade(
        &self,
        _interceptor: &Address,
        request: &TradeAuthorization,
    ) -> Result<bool, CollaboratorError> {
        self.interceptor_requests.borrow_mut().push(request.clone());
        self.interceptor_decision
            .clone()
            .unwrap_or_else(|| Err(CollaboratorError::new("interceptor", "reverted")))
    }
}

impl BurnRateRegistry for MockChain {
    fn burn_rate(&self, _token: &Address) -> BurnRate {
        BurnRate::default()
    }

    fn rebate_rate(&self, _owner: &Address) -> u16 {
        0
    }
}

impl FilledLedger for MockChain {
    fn filled(&self, hash: &OrderHash) -> Amount {
        self.filled.get(hash).copied().unwrap_or(Amount::ZERO)
    }
}

impl CancellationLedger for MockChain {
    fn is_cancelled(&self, hash: &OrderHash) -> bool {
        self.cancelled.contains(hash)
    }

    fn cutoff(&self, owner: &Address) -> Option<u64> {
        self.cutoffs.get(owner).copied()
    }

    fn trading_pair_cutoff(
        &self,
        owner: &Address,
        token_s: &Address,
        token_b: &Address,
    ) -> Option<u64> {
        self.pair_cutoffs.get(&(*owner, *token_s, *token_b)).copied()
    }
}

impl FeeLedger for MockChain {
    fn fee_balance(&self, _owner: &Address, _token: &Address) -> Amount {
        Amount::ZERO
    }
}

impl TokenLedger for MockChain {
    fn token_type(&self, _token: &Address) -> Option<TokenType> {
        Some(TokenType::Fungible)
    }

    fn balance_of(&self, _token: &Address, _owner: &Address, _tranche: &Tranche) -> Amount {
        Amount::ZERO
    }

    fn allowance(&self, _token: &Address, _owner: &Address, _spender: &Address) -> Amount {
        Amount::ZERO
    }

    fn is_operator(&self, _token: &Address, _holder: &Address, _operator: &Address) -> bool {
        false
    }

    fn can_send(
        &self,
        _token: &Address,
        _from: &Address,
        _to: &Address,
        _tranche: &Tranche,
        _amount: Amount,
    ) -> Result<bool, CollaboratorError> {
        Ok(false)
    }
}
