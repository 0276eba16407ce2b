//! Per-submission execution context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, ProtocolConfig};

/// Immutable environment a submission is settled in.
///
/// The engine never mutates a context; the oracle reports the advanced
/// `ring_index` in its report instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub block_number: u64,
    /// Unix seconds of the including block.
    pub block_timestamp: u64,
    /// The submitter of the batch.
    pub transaction_origin: Address,
    pub trade_delegate: Address,
    pub fee_holder: Address,
    pub broker_registry: Address,
    pub order_registry: Address,
    pub order_book: Address,
    pub burn_rate_table: Address,
    pub base_token: Address,
    pub fee_percentage_base: u16,
    pub burn_base_percentage: u16,
    pub max_ring_size: usize,
    pub max_orders_per_submission: usize,
    /// Index the first ring mined by this submission will carry.
    pub ring_index: u64,
}

impl Context {
    #[must_use]
    pub fn from_config(
        config: &ProtocolConfig,
        block_number: u64,
        block_time: DateTime<Utc>,
        transaction_origin: Address,
    ) -> Self {
        Self {
            block_number,
            block_timestamp: u64::try_from(block_time.timestamp()).unwrap_or(0),
            transaction_origin,
            trade_delegate: config.trade_delegate,
            fee_holder: config.fee_holder,
            broker_registry: config.broker_registry,
            order_registry: config.order_registry,
            order_book: config.order_book,
            burn_rate_table: config.burn_rate_table,
            base_token: config.base_token,
            fee_percentage_base: config.fee_percentage_base,
            burn_base_percentage: config.burn_base_percentage,
            max_ring_size: config.max_ring_size,
            max_orders_per_submission: config.max_orders_per_submission,
            ring_index: 0,
        }
    }

    #[must_use]
    pub fn with_ring_index(mut self, ring_index: u64) -> Self {
        self.ring_index = ring_index;
        self
    }

    #[must_use]
    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.block_timestamp).ok()?;
        DateTime::from_timestamp(seconds, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_copies_deployment() {
        let config = ProtocolConfig {
            fee_holder: Address::repeat_byte(0xfe),
            base_token: Address::repeat_byte(0x1c),
            ..ProtocolConfig::default()
        };
        let time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let ctx = Context::from_config(&config, 42, time, Address::repeat_byte(0x01));
        assert_eq!(ctx.block_number, 42);
        assert_eq!(ctx.block_timestamp, 1_700_000_000);
        assert_eq!(ctx.fee_holder, config.fee_holder);
        assert_eq!(ctx.base_token, config.base_token);
        assert_eq!(ctx.ring_index, 0);
        assert_eq!(ctx.block_time(), Some(time));
    }

    #[test]
    fn pre_epoch_time_clamps_to_zero() {
        let time = DateTime::from_timestamp(-5, 0).unwrap();
        let ctx = Context::from_config(&ProtocolConfig::default(), 1, time, Address::ZERO)
            .with_ring_index(9);
        assert_eq!(ctx.block_timestamp, 0);
        assert_eq!(ctx.ring_index, 9);
    }
}
