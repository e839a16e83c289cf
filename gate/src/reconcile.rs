//! Best-effort cart reconciliation after a successful claim.

use lootpool_store::{Store, TenantFilter};
use tracing::{info, warn};

/// Mark the winner's matching pending-delivery entries as delivered.
///
/// Runs after the claim has already been authorized; by contract nothing here
/// may undo that, so every failure is logged and swallowed. Entries are
/// matched by `(winner, reward_reference)` value with no tenant constraint:
/// cart rows are denormalized convenience records and may predate
/// partitioning.
pub async fn resolve_cart_entries(store: &dyn Store, winner: &str, reward_reference: &str) {
    match store
        .resolve_pending_deliveries(winner, reward_reference, TenantFilter::Any)
        .await
    {
        Ok(0) => {}
        Ok(resolved) => {
            info!(winner, reward_reference, resolved, "marked cart entries delivered");
        }
        Err(err) => {
            warn!(
                winner,
                reward_reference,
                ?err,
                "cart reconciliation failed; claim authorization is unaffected"
            );
        }
    }
}
