use std::future::Future;

use tracing::{debug, warn};

use orgdesk_infra::{CredentialStore, StoreTx, TxFuture};

use crate::error::{ServiceError, ServiceResult};

/// Whole-transaction attempts for operations that mint numbers.
pub const TRANSACTION_ATTEMPTS: u32 = 3;

/// Run a read-only unit of work. The transaction is always rolled back.
pub(crate) async fn read_only<S, T, F>(store: &S, work: F) -> ServiceResult<T>
where
    S: CredentialStore + ?Sized,
    F: for<'t> FnOnce(&'t mut dyn StoreTx) -> TxFuture<'t, T, ServiceError>,
{
    let mut tx = store.begin().await?;
    let result = work(tx.as_mut()).await;
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "read-only transaction rollback failed");
    }
    result
}

/// Re-run `op` while it fails with [`ServiceError::Collision`].
pub(crate) async fn retry_on_collision<T, F, Fut>(mut op: F) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(ServiceError::Collision(constraint)) if attempt < TRANSACTION_ATTEMPTS => {
                debug!(%constraint, attempt, "unique key collision, retrying transaction");
                attempt += 1;
            }
            other => return other,
        }
    }
}
