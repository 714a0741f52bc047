// ============================================================================
// Abonnement aux transactions pending
// ============================================================================
// Sur HTTP il n'y a pas de push : on installe un filtre
// (eth_newPendingTransactionFilter) puis on le poll (eth_getFilterChanges).
// Chaque hash reçu remplace le message de statut de la session.
//
// CONCEPT RUST : RAII pour une ressource distante
// - subscribe() retourne un SubscriptionHandle
// - release() ou Drop envoie le signal d'annulation (oneshot)
// - La tâche s'arrête et désinstalle le filtre chez le provider
// - Impossible d'oublier l'abonnement : il vit exactement aussi longtemps
//   que son handle
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::error::WalletError;
use crate::api::provider::{FilterId, WalletProvider};
use crate::controller::SessionPublisher;
use crate::models::{StatusMessage, TxHash};

/// Handle d'annulation de l'abonnement
pub struct SubscriptionHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Annule l'abonnement et retourne la tâche pour pouvoir l'attendre
    pub fn release(mut self) -> Option<JoinHandle<()>> {
        self.signal();
        self.task.take()
    }

    /// Vrai si la tâche de polling est terminée
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|task| task.is_finished()).unwrap_or(true)
    }

    fn signal(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // Err si la tâche est déjà terminée : rien à annuler
            let _ = cancel.send(());
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

/// Démarre l'abonnement aux transactions pending
///
/// Doit être appelé depuis un runtime tokio.
pub fn subscribe(
    provider: Arc<dyn WalletProvider>,
    publisher: SessionPublisher,
    poll_interval: Duration,
) -> SubscriptionHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(pending_transactions_feed(provider, publisher, poll_interval, cancel_rx));

    SubscriptionHandle {
        cancel: Some(cancel_tx),
        task: Some(task),
    }
}

/// Boucle de polling, jusqu'à l'annulation
async fn pending_transactions_feed(
    provider: Arc<dyn WalletProvider>,
    publisher: SessionPublisher,
    poll_interval: Duration,
    mut cancel: oneshot::Receiver<()>,
) {
    let filter = tokio::select! {
        biased;
        _ = &mut cancel => return,
        created = provider.new_pending_transaction_filter() => match created {
            Ok(filter) => filter,
            Err(e) => {
                warn!(error = %e, "Pending transaction subscription unavailable");
                return;
            }
        },
    };
    info!(%filter, "Subscribed to pending transactions");

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // CONCEPT : select! biaisé
        // - L'annulation est vérifiée en premier
        // - Un poll en vol est abandonné : aucun statut publié après release()
        tokio::select! {
            biased;
            _ = &mut cancel => break,
            changes = next_changes(provider.as_ref(), &filter, &mut ticker) => match changes {
                Ok(hashes) => {
                    for hash in hashes {
                        debug!(%hash, "New pending transaction");
                        publisher.set_status(StatusMessage::PendingTransaction(hash));
                    }
                }
                Err(e) => warn!(error = %e, "Failed to poll pending transactions"),
            },
        }
    }

    match provider.uninstall_filter(&filter).await {
        Ok(removed) => info!(%filter, removed, "Pending transaction subscription released"),
        Err(e) => warn!(%filter, error = %e, "Failed to uninstall pending transaction filter"),
    }
}

/// Attend le prochain tick puis récupère les nouveaux hashes
async fn next_changes(
    provider: &dyn WalletProvider,
    filter: &FilterId,
    ticker: &mut Interval,
) -> Result<Vec<TxHash>, WalletError> {
    ticker.tick().await;
    provider.filter_changes(filter).await
}

// ============================================================================
// Tests unitaires
// ============================================================================
