use alloy_primitives::hex;
use filament_rpc_types::FilterId;
use rand::{rngs::OsRng, RngCore};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

/// Generates a process-wide unique subscription id.
///
/// The first 8 bytes come from a monotonically increasing counter, the
/// remaining 8 from the OS entropy source. The counter alone guarantees
/// uniqueness; if no entropy source is available after a few attempts, the
/// random half stays zeroed.
pub fn next_subscription_id() -> FilterId {
    let mut id = [0u8; 16];
    let seq = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
    id[..8].copy_from_slice(&seq.to_le_bytes());
    for _ in 0..4 {
        if OsRng.try_fill_bytes(&mut id[8..]).is_ok() {
            break;
        }
    }
    FilterId::from(hex::encode(id))
}
