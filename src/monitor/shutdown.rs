use std::sync::Arc;

use tokio::select;
use tokio_util::sync::CancellationToken;

use super::session::ActivitySession;

/// Detects signals sent to the process and winds the monitor down. Also
/// resolves when the token is cancelled from elsewhere, so the shutdown task
/// doesn't outlive a session ended by the alert policy.
pub async fn detect_shutdown(cancellation: CancellationToken, session: Arc<ActivitySession>) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\nMonitoring stopped by user");
            session.stop();
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => (),
    };
}
