// ============================================================================
// Attente du reçu d'une transaction
// ============================================================================
// Après eth_sendTransaction, on poll eth_getTransactionReceipt jusqu'à ce que
// la transaction soit minée, avec un timeout global.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::api::error::WalletError;
use crate::api::provider::WalletProvider;
use crate::controller::SessionPublisher;
use crate::models::{StatusMessage, TransactionReceipt, TxHash};

/// Attend le reçu de `hash` et publie le statut final (confirmé ou échec)
pub async fn watch_receipt(
    provider: Arc<dyn WalletProvider>,
    hash: TxHash,
    publisher: SessionPublisher,
    poll_interval: Duration,
    confirmation_timeout: Duration,
) {
    let outcome = match tokio::time::timeout(
        confirmation_timeout,
        poll_receipt(provider.as_ref(), &hash, poll_interval),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(WalletError::ConfirmationTimeout(hash)),
    };

    let status = match outcome {
        Ok(receipt) if receipt.success => {
            info!(%hash, block = receipt.block_number, "Transaction confirmed");
            StatusMessage::Confirmed(receipt.block_number)
        }
        Ok(receipt) => {
            error!(%hash, block = receipt.block_number, "Transaction reverted");
            StatusMessage::TransactionFailed(WalletError::Reverted(hash).to_string())
        }
        Err(e) => {
            error!(%hash, error = %e, "Transaction confirmation failed");
            StatusMessage::TransactionFailed(e.to_string())
        }
    };

    publisher.set_status(status);
}

/// Poll jusqu'à obtenir un reçu ; une erreur du provider est terminale
async fn poll_receipt(
    provider: &dyn WalletProvider,
    hash: &TxHash,
    poll_interval: Duration,
) -> Result<TransactionReceipt, WalletError> {
    loop {
        if let Some(receipt) = provider.transaction_receipt(hash).await? {
            return Ok(receipt);
        }
        tokio::time::sleep(poll_interval).await;
    }
}
