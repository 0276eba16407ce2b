//! Submission sealer: hashes a submission and authorizes its miner.
//!
//! Sealing is the batch-level gate that runs before any order is looked at:
//!
//! 1. Every ring index must point into the order array
//! 2. The order count must be within the configured limit
//! 3. Order hashes, ring hashes and the mining hash are computed once
//! 4. The miner must be the submitter or must have signed the mining hash
//!
//! Every failure here is fatal for the whole submission.

use ringsettle_types::{
    Address, Context, MiningHash, OrderHash, Result, RingHash, RingsettleError, SignAlgorithm,
    Submission,
};

/// How the miner of a submission was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningAuthorization {
    /// The miner submitted the transaction itself; no signature is needed.
    SubmitterIsMiner,
    Signature(SignAlgorithm),
}

/// A submission whose identities are computed and whose miner is authorized.
#[derive(Debug, Clone)]
pub struct SealedSubmission {
    pub order_hashes: Vec<OrderHash>,
    pub ring_hashes: Vec<RingHash>,
    pub mining_hash: MiningHash,
    pub fee_recipient: Address,
    pub miner: Address,
    pub authorization: MiningAuthorization,
}

/// Seals submissions against one context.
pub struct SubmissionSealer<'a> {
    context: &'a Context,
}

impl<'a> SubmissionSealer<'a> {
    #[must_use]
    pub fn new(context: &'a Context) -> Self {
        Self { context }
    }

    pub fn seal(&self, submission: &Submission) -> Result<SealedSubmission> {
        submission.check_bounds()?;
        if submission.orders.len() > self.context.max_orders_per_submission {
            return Err(RingsettleError::MalformedSubmission {
                reason: format!(
                    "{} orders exceed the limit of {}",
                    submission.orders.len(),
                    self.context.max_orders_per_submission
                ),
            });
        }

        let origin = self.context.transaction_origin;
        let order_hashes = submission.order_hashes();
        let ring_hashes = submission.ring_hashes(&order_hashes)?;
        let mining_hash = submission.mining_hash(origin, &order_hashes)?;
        let fee_recipient = submission.resolved_fee_recipient(origin);
        let miner = submission.resolved_miner(origin);
        let authorization = Self::authorize_miner(submission, miner, origin, &mining_hash)?;

        tracing::debug!(
            mining_hash = %mining_hash,
            orders = order_hashes.len(),
            rings = ring_hashes.len(),
            %miner,
            authorization = ?authorization,
            "Submission sealed"
        );

        Ok(SealedSubmission {
            order_hashes,
            ring_hashes,
            mining_hash,
            fee_recipient,
            miner,
            authorization,
        })
    }

    fn authorize_miner(
        submission: &Submission,
        miner: Address,
        origin: Address,
        mining_hash: &MiningHash,
    ) -> Result<MiningAuthorization> {
        if miner == origin {
            return Ok(MiningAuthorization::SubmitterIsMiner);
        }
        match &submission.sig {
            Some(sig) if sig.verify(&miner, mining_hash.as_bytes()) => {
                Ok(MiningAuthorization::Signature(sig.algorithm))
            }
            _ => Err(RingsettleError::MissingRequiredSignature { miner }),
        }
    }
}
