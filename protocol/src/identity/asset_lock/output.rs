//! Resolving a proof to the output it locks, and pricing that output in
//! credits.

use tracing::{debug, warn};

use super::transaction::{CoreTransaction, TransactionOutput};
use super::{AssetLockError, AssetLockProof};
use crate::config::CREDITS_PER_SATOSHI;
use crate::storage::StateRepository;

/// Find the transaction output a proof refers to.
///
/// Instant proofs parse their embedded transaction. Chain proofs ask the
/// repository for the transaction named by the out point.
pub fn fetch_asset_lock_output<R>(
    repository: &R,
    proof: &AssetLockProof,
) -> Result<TransactionOutput, AssetLockError>
where
    R: StateRepository + ?Sized,
{
    match proof {
        AssetLockProof::Instant(instant) => instant.output(),
        AssetLockProof::Chain(chain) => {
            let tx_hash = chain.tx_hash();
            debug!(tx_hash = %hex::encode(tx_hash), "fetching chain asset lock transaction");
            let raw = repository.fetch_transaction(&tx_hash)?.ok_or_else(|| {
                AssetLockError::TransactionNotFound {
                    tx_hash: hex::encode(tx_hash),
                }
            })?;
            let transaction = CoreTransaction::from_bytes(&raw)?;
            transaction.output(chain.output_index()).cloned()
        }
    }
}

/// Convert locked duffs into platform credits at the fixed ratio.
pub fn credits_from_satoshis(satoshis: u64) -> Result<u64, AssetLockError> {
    satoshis
        .checked_mul(CREDITS_PER_SATOSHI)
        .ok_or(AssetLockError::CreditsOverflow { satoshis })
}

/// Fail if the proof's out point has already funded an identity.
pub fn ensure_out_point_unused<R>(repository: &R, proof: &AssetLockProof) -> Result<(), AssetLockError>
where
    R: StateRepository + ?Sized,
{
    let out_point = proof.out_point();
    if repository.is_asset_lock_transaction_out_point_already_used(&out_point)? {
        let out_point = hex::encode(out_point);
        warn!(%out_point, "rejecting reused asset lock out point");
        return Err(AssetLockError::OutPointAlreadyUsed { out_point });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::asset_lock::{ChainAssetLockProof, InstantAssetLockProof};
    use crate::storage::InMemoryStateRepository;

    fn lock_tx() -> CoreTransaction {
        CoreTransaction::with_outputs(vec![TransactionOutput::asset_lock(250, [8; 20])])
    }

    #[test]
    fn test_instant_output_needs_no_repository() {
        let repo = InMemoryStateRepository::new();
        let proof: AssetLockProof = InstantAssetLockProof::new(vec![], lock_tx().to_bytes(), 0).into();
        let output = fetch_asset_lock_output(&repo, &proof).unwrap();
        assert_eq!(output.satoshis, 250);
    }

    #[test]
    fn test_chain_output_fetched_from_repository() {
        let repo = InMemoryStateRepository::new();
        let tx = lock_tx();
        repo.insert_transaction(tx.to_bytes());

        let proof: AssetLockProof = ChainAssetLockProof::from_parts(1, &tx.hash(), 0).into();
        let output = fetch_asset_lock_output(&repo, &proof).unwrap();
        assert_eq!(output, tx.outputs[0]);
    }

    #[test]
    fn test_chain_transaction_missing() {
        let repo = InMemoryStateRepository::new();
        let proof: AssetLockProof = ChainAssetLockProof::from_parts(1, &[0xee; 32], 0).into();
        assert_eq!(
            fetch_asset_lock_output(&repo, &proof),
            Err(AssetLockError::TransactionNotFound {
                tx_hash: hex::encode([0xee; 32])
            })
        );
    }

    #[test]
    fn test_chain_output_index_beyond_outputs() {
        let repo = InMemoryStateRepository::new();
        let tx = lock_tx();
        repo.insert_transaction(tx.to_bytes());
        let proof: AssetLockProof = ChainAssetLockProof::from_parts(1, &tx.hash(), 4).into();
        assert!(matches!(
            fetch_asset_lock_output(&repo, &proof),
            Err(AssetLockError::OutputNotFound { output_index: 4, output_count: 1 })
        ));
    }

    #[test]
    fn test_credit_conversion() {
        assert_eq!(credits_from_satoshis(0).unwrap(), 0);
        assert_eq!(credits_from_satoshis(250).unwrap(), 250_000);
        assert_eq!(
            credits_from_satoshis(u64::MAX),
            Err(AssetLockError::CreditsOverflow { satoshis: u64::MAX })
        );
    }

    #[test]
    fn test_used_out_point_rejected() {
        let repo = InMemoryStateRepository::new();
        let proof: AssetLockProof = InstantAssetLockProof::new(vec![], lock_tx().to_bytes(), 0).into();
        assert!(ensure_out_point_unused(&repo, &proof).is_ok());

        repo.mark_asset_lock_transaction_out_point_as_used(&proof.out_point())
            .unwrap();
        assert!(matches!(
            ensure_out_point_unused(&repo, &proof),
            Err(AssetLockError::OutPointAlreadyUsed { .. })
        ));
    }
}
