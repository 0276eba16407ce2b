//! Order validator, the gate every order passes before it may settle.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. Structure: distinct tokens, positive amounts, a single fee mode,
//!    percentages within their bases
//! 2. Time window `[valid_since, valid_until)`
//! 3. Cancellation: per-hash flag, owner cutoff, trading-pair cutoff
//! 4. Authenticity (first applicable proof):
//!    order-book submission for on-chain orders, a signature by the owner or
//!    broker, an earlier partial fill, a registered hash
//! 5. Broker registration and interceptor approval
//! 6. Dual authorization over the mining hash
//!
//! ## Design Principles
//!
//! - **Fail-closed**: anything that cannot be proven valid is rejected
//! - **Local**: a rejection only voids rings that contain the order
//! - **Injected state**: all ledger and registry reads go through [`ChainState`]

use ringsettle_types::constants::WALLET_SPLIT_PERCENTAGE_BASE;
use ringsettle_types::{
    AuthenticityProof, ChainState, Context, ExemptionReason, MiningHash, Order, OrderHash,
    OrderRejection, TradeAuthorization, ValidationOutcome,
};

/// Validates orders against the context and chain state of one submission.
pub struct OrderValidator<'a> {
    context: &'a Context,
    /// Needed only to check dual-authorization signatures.
    mining_hash: Option<MiningHash>,
}

impl<'a> OrderValidator<'a> {
    #[must_use]
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            mining_hash: None,
        }
    }

    #[must_use]
    pub fn with_mining_hash(mut self, mining_hash: MiningHash) -> Self {
        self.mining_hash = Some(mining_hash);
        self
    }

    /// Validate `order` against `state`.
    pub fn validate<S: ChainState + ?Sized>(&self, order: &Order, state: &S) -> ValidationOutcome {
        let hash = order.hash();
        let outcome = self.evaluate(order, &hash, state);
        match &outcome {
            ValidationOutcome::Invalid(rejection) => {
                tracing::debug!(order = %hash, rejection = %rejection, "Order rejected");
            }
            accepted => {
                tracing::debug!(order = %hash, outcome = ?accepted, "Order accepted");
            }
        }
        outcome
    }

    fn evaluate<S: ChainState + ?Sized>(
        &self,
        order: &Order,
        hash: &OrderHash,
        state: &S,
    ) -> ValidationOutcome {
        if let Err(rejection) = self.check_structure(order) {
            return ValidationOutcome::Invalid(rejection);
        }
        if let Err(rejection) = self.check_time_window(order) {
            return ValidationOutcome::Invalid(rejection);
        }
        if Self::is_cancelled(order, hash, state) {
            return ValidationOutcome::Invalid(OrderRejection::OrderCancelled);
        }
        let authenticated = match Self::authenticate(order, hash, state) {
            Ok(outcome) => outcome,
            Err(rejection) => return ValidationOutcome::Invalid(rejection),
        };
        if let Err(rejection) = Self::check_broker(order, hash, state) {
            return ValidationOutcome::Invalid(rejection);
        }
        if let Err(rejection) = self.check_dual_auth(order) {
            return ValidationOutcome::Invalid(rejection);
        }
        authenticated
    }

    fn check_structure(&self, order: &Order) -> Result<(), OrderRejection> {
        if order.token_s == order.token_b {
            return Err(OrderRejection::InvalidTokenPair);
        }
        if order.amount_s.is_zero() || order.amount_b.is_zero() {
            return Err(OrderRejection::InvalidAmount);
        }
        let base = self.context.fee_percentage_base;
        if order.waive_fee_percentage > base
            || order.token_s_fee_percentage > base
            || order.token_b_fee_percentage > base
        {
            return Err(OrderRejection::InvalidFeeMode);
        }
        let has_percentage_fee =
            order.token_s_fee_percentage != 0 || order.token_b_fee_percentage != 0;
        if order.is_p2p() && !order.fee_amount.is_zero() {
            return Err(OrderRejection::InvalidFeeMode);
        }
        if !order.is_p2p() && has_percentage_fee {
            return Err(OrderRejection::InvalidFeeMode);
        }
        if order.wallet_split_percentage > WALLET_SPLIT_PERCENTAGE_BASE {
            return Err(OrderRejection::InvalidWalletSplit);
        }
        Ok(())
    }

    fn check_time_window(&self, order: &Order) -> Result<(), OrderRejection> {
        let now = self.context.block_timestamp;
        if order.valid_since > now {
            return Err(OrderRejection::OrderNotYetValid);
        }
        if order.is_expired_at(now) {
            return Err(OrderRejection::OrderExpired);
        }
        Ok(())
    }

    fn is_cancelled<S: ChainState + ?Sized>(order: &Order, hash: &OrderHash, state: &S) -> bool {
        if state.is_cancelled(hash) {
            return true;
        }
        let owner_cutoff = state.cutoff(&order.owner);
        let pair_cutoff = state.trading_pair_cutoff(&order.owner, &order.token_s, &order.token_b);
        [owner_cutoff, pair_cutoff]
            .into_iter()
            .flatten()
            .any(|cutoff| order.valid_since <= cutoff)
    }

    /// Evaluate the authenticity proofs in priority order.
    fn authenticate<S: ChainState + ?Sized>(
        order: &Order,
        hash: &OrderHash,
        state: &S,
    ) -> Result<ValidationOutcome, OrderRejection> {
        if order.on_chain {
            return if state.is_order_submitted(hash) {
                Ok(ValidationOutcome::Exempt(ExemptionReason::OrderBookSubmission))
            } else {
                Err(OrderRejection::OrderNotSubmitted)
            };
        }
        if let Some(sig) = &order.sig {
            if sig.verify(&order.signer(), hash.as_bytes()) {
                return Ok(ValidationOutcome::Valid(AuthenticityProof::Signature(
                    sig.algorithm,
                )));
            }
        }
        if !state.filled(hash).is_zero() {
            return Ok(ValidationOutcome::Exempt(ExemptionReason::PreviouslyFilled));
        }
        if state.is_order_hash_registered(&order.owner, hash) {
            return Ok(ValidationOutcome::Exempt(ExemptionReason::HashRegistered));
        }
        Err(OrderRejection::SignatureInvalid)
    }

    fn check_broker<S: ChainState + ?Sized>(
        order: &Order,
        hash: &OrderHash,
        state: &S,
    ) -> Result<(), OrderRejection> {
        let Some(broker) = order.effective_broker() else {
            return Ok(());
        };
        let registration = state
            .broker_registration(&order.owner, &broker)
            .ok_or(OrderRejection::BrokerNotRegistered)?;
        let Some(interceptor) = registration.interceptor else {
            return Ok(());
        };
        let request = TradeAuthorization {
            owner: order.owner,
            broker,
            token: order.token_s,
            amount: order.remaining(state.filled(hash)),
        };
        match state.authorize_trade(&interceptor, &request) {
            Ok(true) => Ok(()),
            Ok(false) => Err(OrderRejection::InterceptorDenied),
            Err(err) => {
                tracing::warn!(order = %hash, %interceptor, error = %err, "Broker interceptor call failed");
                Err(OrderRejection::InterceptorDenied)
            }
        }
    }

    fn check_dual_auth(&self, order: &Order) -> Result<(), OrderRejection> {
        let Some(dual_auth_addr) = order.dual_auth_addr else {
            return Ok(());
        };
        let verified = match (&order.dual_auth_sig, &self.mining_hash) {
            (Some(sig), Some(mining_hash)) => sig.verify(&dual_auth_addr, mining_hash.as_bytes()),
            _ => false,
        };
        if verified {
            Ok(())
        } else {
            Err(OrderRejection::SignatureInvalid)
        }
    }
}
