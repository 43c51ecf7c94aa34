//! Liked-set retraction across all users

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::{RemoteError, SyncError, SyncResult};
use crate::remote::UserDirectory;

/// Remove `listing_id` from the liked-set of every user holding it
///
/// At most `concurrency` updates run at once. All updates are awaited even
/// when some fail; the first failure is then reported together with the
/// failure count. Removal is idempotent, so calling this again after an
/// error finishes the job. Returns how many users were updated.
pub async fn retract_everywhere(
    directory: Arc<dyn UserDirectory>,
    listing_id: &str,
    concurrency: usize,
) -> SyncResult<usize> {
    let user_ids = directory.find_liking(listing_id).await?;
    let total = user_ids.len();
    if total == 0 {
        return Ok(0);
    }

    info!(
        "Retracting listing {} from {} liked-sets (concurrency {})",
        listing_id, total, concurrency
    );

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for user_id in user_ids {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        let directory = Arc::clone(&directory);
        let listing_id = listing_id.to_string();

        tasks.spawn(async move {
            let result = directory.remove_liked(&user_id, &listing_id).await;
            drop(permit);
            result.map_err(|e| (user_id, e))
        });
    }

    let mut failed = 0;
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let error = match joined {
            Ok(Ok(())) => continue,
            Ok(Err((user_id, e))) => {
                warn!("Failed to retract listing {} from user {}: {}", listing_id, user_id, e);
                e
            }
            Err(e) => RemoteError::Backend(format!("retraction task failed: {}", e)),
        };
        failed += 1;
        first_error.get_or_insert(error);
    }

    match first_error {
        Some(source) => Err(SyncError::Fanout {
            failed,
            total,
            source,
        }),
        None => Ok(total),
    }
}
