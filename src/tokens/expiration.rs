//! Per-identity token expiration records and the watcher task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::cache::Shared;

/// Schedules the refresh of one token generation.
///
/// At most one record exists per identity. Installing a new token replaces
/// the record; dropping the old one closes its cancellation channel, which
/// wakes the old watcher so it exits without refreshing.
pub(super) struct TokenExpiration {
    _cancel: oneshot::Sender<()>,
}

impl TokenExpiration {
    pub(super) fn new() -> (Self, oneshot::Receiver<()>) {
        let (cancel, watch) = oneshot::channel();
        (Self { _cancel: cancel }, watch)
    }
}

/// Wait for the token's lifetime to elapse or for this generation to be
/// retired, whichever comes first, and refresh on elapse.
pub(super) async fn watch(
    cache: Arc<Shared>,
    user_id: String,
    ttl: Duration,
    mut cancel: oneshot::Receiver<()>,
) {
    tokio::select! {
        // Cancellation takes priority when both branches are ready: a
        // retired watcher must never fire a refresh.
        biased;

        _ = &mut cancel => {
            debug!(user_id = %user_id, "Auth was refreshed before it expired");
        }
        _ = tokio::time::sleep(ttl) => {
            refresh(&cache, &user_id).await;
        }
    }
}

async fn refresh(cache: &Shared, user_id: &str) {
    info!(user_id = %user_id, "Auth token expired, refreshing");

    // Fresh read under the lock: the token may have been cleared or
    // replaced while this watcher slept.
    let Some(token) = cache.get_token(user_id) else {
        debug!(user_id = %user_id, "Token already cleared, nothing to refresh");
        return;
    };

    let Some(client) = cache.registry().get(user_id) else {
        debug!(user_id = %user_id, "No managed client for expiring token");
        return;
    };

    if let Err(e) = client.auth_refresh(&token).await {
        error!(
            user_id = %user_id,
            error = %e,
            "Token refresh failed before expiration"
        );
    }
}
