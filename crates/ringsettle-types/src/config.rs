//! Protocol configuration.
//!
//! A [`ProtocolConfig`] names the deployment (collaborator addresses, the
//! protocol base token) and the numeric bases the fee maths runs on. It is
//! loaded from JSON; missing fields take the defaults from
//! [`constants`](crate::constants).

use serde::{Deserialize, Serialize};

use crate::Address;
use crate::constants;
use crate::error::{Result, RingsettleError};

/// Deployment and fee-base configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Spender / operator identity the engine moves tokens as.
    pub trade_delegate: Address,
    /// Account that collects fees before they are distributed.
    pub fee_holder: Address,
    pub broker_registry: Address,
    pub order_registry: Address,
    pub order_book: Address,
    pub burn_rate_table: Address,
    /// Default fee token.
    pub base_token: Address,
    pub fee_percentage_base: u16,
    pub burn_base_percentage: u16,
    pub max_ring_size: usize,
    pub max_orders_per_submission: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            trade_delegate: Address::ZERO,
            fee_holder: Address::ZERO,
            broker_registry: Address::ZERO,
            order_registry: Address::ZERO,
            order_book: Address::ZERO,
            burn_rate_table: Address::ZERO,
            base_token: Address::ZERO,
            fee_percentage_base: constants::FEE_PERCENTAGE_BASE,
            burn_base_percentage: constants::BURN_BASE_PERCENTAGE,
            max_ring_size: constants::MAX_RING_SIZE,
            max_orders_per_submission: constants::MAX_ORDERS_PER_SUBMISSION,
        }
    }
}

impl ProtocolConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| RingsettleError::Configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fee_percentage_base == 0 {
            return Err(RingsettleError::Configuration(
                "fee_percentage_base must be non-zero".into(),
            ));
        }
        if self.burn_base_percentage == 0 {
            return Err(RingsettleError::Configuration(
                "burn_base_percentage must be non-zero".into(),
            ));
        }
        if self.max_ring_size < constants::MIN_RING_SIZE {
            return Err(RingsettleError::Configuration(format!(
                "max_ring_size {} below minimum {}",
                self.max_ring_size,
                constants::MIN_RING_SIZE
            )));
        }
        if self.max_orders_per_submission > constants::MAX_ORDERS_PER_SUBMISSION {
            return Err(RingsettleError::Configuration(format!(
                "max_orders_per_submission {} above wire limit {}",
                self.max_orders_per_submission,
                constants::MAX_ORDERS_PER_SUBMISSION
            )));
        }
        Ok(())
    }
}
