use std::future::Future;

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Returns a token that is cancelled once `signal` completes.
pub fn cancel_on<F>(signal: F) -> CancellationToken
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        signal.await;
        tracing::info!("shutdown requested, cancelling crawl");
        cancel.cancel();
    });
    token
}

/// Returns a token that is cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    cancel_on(async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for event: {:?}", error);
            std::future::pending::<()>().await;
        }
    })
}
