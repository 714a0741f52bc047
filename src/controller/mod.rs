// ============================================================================
// Wallet Session Controller
// ============================================================================
// Le seul composant "métier" de l'application :
// - détecter le wallet provider (fait en amont, voir api::provider)
// - connect() : demander l'autorisation, lire le solde, s'abonner aux pending
// - disconnect() : repasser en déconnecté et libérer l'abonnement
// - send_transaction() : envoyer le transfert fixe et suivre son reçu
//
// Transitions :
//   {Disconnected} --connect() ok--> {Connected}
//   {Connected} --disconnect()--> {Disconnected}
//   connect() en échec : l'état ne change pas
//   send_transaction() ne change jamais l'état de connexion
//
// CONCEPT RUST : Flux unidirectionnel
// - Le controller ne modifie jamais l'UI directement
// - Chaque transition produit un nouveau Session (immuable)
// - Le SessionPublisher l'envoie sur un channel mpsc vers l'event loop
// ============================================================================

pub mod receipt;      // Suivi du reçu après envoi
pub mod subscription; // Abonnement annulable aux transactions pending

use std::sync::{mpsc, Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::api::error::WalletError;
use crate::api::provider::{ProviderHandle, WalletProvider};
use crate::config::Config;
use crate::models::{Address, Session, StatusMessage, TransactionRequest, U256};

pub use subscription::SubscriptionHandle;

// ============================================================================
// SessionPublisher
// ============================================================================

/// Détient le snapshot courant et publie chaque remplacement
///
/// Clonable : le controller, l'abonnement et le suivi de reçu écrivent tous
/// dans la même session (le dernier qui écrit gagne).
#[derive(Clone)]
pub struct SessionPublisher {
    current: Arc<Mutex<Session>>,
    updates: mpsc::Sender<Session>,
}

impl SessionPublisher {
    pub fn new(updates: mpsc::Sender<Session>) -> Self {
        Self {
            current: Arc::new(Mutex::new(Session::new())),
            updates,
        }
    }

    /// Copie du snapshot courant
    pub fn snapshot(&self) -> Session {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Remplace la session par `transition(&courante)` et la publie
    ///
    /// L'envoi a lieu sous le verrou : l'ordre du channel est l'ordre des
    /// remplacements, le dernier reçu par l'UI est toujours le courant.
    pub fn publish<F>(&self, transition: F) -> Session
    where
        F: FnOnce(&Session) -> Session,
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = transition(&current);

        // mpsc::Sender::send ne bloque jamais (channel non borné)
        if self.updates.send(current.clone()).is_err() {
            debug!("Session receiver dropped, update not delivered");
        }
        current.clone()
    }

    /// Raccourci : nouveau message de statut, le reste inchangé
    pub fn set_status(&self, status: StatusMessage) -> Session {
        self.publish(|session| session.with_status(status))
    }
}

// ============================================================================
// WalletSessionController
// ============================================================================

pub struct WalletSessionController {
    provider: Option<ProviderHandle>,
    config: Config,
    publisher: SessionPublisher,
    subscription: Option<SubscriptionHandle>,
}

impl WalletSessionController {
    /// Crée le controller ; `provider` vaut None si rien n'a été détecté
    pub fn new(provider: Option<ProviderHandle>, config: Config, updates: mpsc::Sender<Session>) -> Self {
        Self {
            provider,
            config,
            publisher: SessionPublisher::new(updates),
            subscription: None,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn session(&self) -> Session {
        self.publisher.snapshot()
    }

    /// Vrai tant qu'un abonnement pending est actif
    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().map(|s| !s.is_finished()).unwrap_or(false)
    }

    /// Connecte le wallet
    ///
    /// Non idempotent : rappeler connect() relance tout le flux, et remplace
    /// l'abonnement précédent. Doit tourner dans un runtime tokio.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> Session {
        info!("Connecting to wallet provider");
        self.publisher.set_status(StatusMessage::Connecting);

        let Some(handle) = self.provider.clone() else {
            warn!("Connect requested without a wallet provider");
            return self
                .publisher
                .set_status(StatusMessage::ConnectionFailed(WalletError::NoProvider.to_string()));
        };

        let provider = handle.provider();
        match authorize(provider.as_ref()).await {
            Ok((account, balance)) => {
                info!(%account, balance = %balance, "Wallet connected");
                let session = self
                    .publisher
                    .publish(|_| Session::connected(account, balance.to_string()));

                // L'ancien handle est droppé ici : son abonnement est annulé
                self.subscription = Some(subscription::subscribe(
                    provider,
                    self.publisher.clone(),
                    self.config.poll_interval,
                ));
                session
            }
            Err(e) => {
                error!(error = %e, "Wallet connection failed");
                self.publisher
                    .set_status(StatusMessage::ConnectionFailed(e.to_string()))
            }
        }
    }

    /// Déconnecte (état local uniquement, l'autorisation du provider reste)
    ///
    /// Toujours libère l'abonnement pending. Idempotent.
    pub fn disconnect(&mut self) -> Session {
        if let Some(subscription) = self.subscription.take() {
            debug!("Releasing pending transaction subscription");
            // La tâche continue seule jusqu'à la désinstallation du filtre
            drop(subscription.release());
        }

        info!("Wallet disconnected");
        self.publisher.publish(Session::disconnected)
    }

    /// Envoie le transfert fixe (0.01 ETH vers l'adresse constante, gas 21000)
    ///
    /// Ne vérifie pas l'état de connexion : seul le provider compte.
    /// Retourne la tâche de suivi du reçu si la transaction a un hash.
    #[instrument(skip(self))]
    pub async fn send_transaction(&self) -> Option<JoinHandle<()>> {
        self.publisher.set_status(StatusMessage::Sending);

        let Some(handle) = &self.provider else {
            warn!("Send requested without a wallet provider");
            self.publisher
                .set_status(StatusMessage::Error(WalletError::NoProvider.to_string()));
            return None;
        };
        let provider = handle.provider();

        let sender = match first_account(provider.accounts().await) {
            Ok(sender) => sender,
            Err(e) => {
                error!(error = %e, "Cannot determine sender account");
                self.publisher.set_status(StatusMessage::Error(e.to_string()));
                return None;
            }
        };

        let tx = match TransactionRequest::fixed_transfer(sender) {
            Ok(tx) => tx,
            Err(e) => {
                error!(error = ?e, "Failed to build transfer");
                self.publisher.set_status(StatusMessage::Error(e.to_string()));
                return None;
            }
        };

        info!(from = %tx.from, to = %tx.to, value = %tx.value, gas = tx.gas, "Submitting transaction");
        let hash = match provider.send_transaction(&tx).await {
            Ok(hash) => hash,
            Err(e) => {
                error!(error = %e, "Transaction submission failed");
                self.publisher
                    .set_status(StatusMessage::TransactionFailed(e.to_string()));
                return None;
            }
        };

        info!(%hash, "Transaction sent");
        self.publisher.set_status(StatusMessage::Sent(hash));

        Some(tokio::spawn(receipt::watch_receipt(
            provider,
            hash,
            self.publisher.clone(),
            self.config.poll_interval,
            self.config.confirmation_timeout,
        )))
    }
}

/// Autorisation + lecture du solde du premier compte
async fn authorize(provider: &dyn WalletProvider) -> Result<(Address, U256), WalletError> {
    let account = first_account(provider.request_accounts().await)?;
    let balance = provider.balance(&account).await?;
    Ok((account, balance))
}

fn first_account(accounts: Result<Vec<Address>, WalletError>) -> Result<Address, WalletError> {
    accounts?.into_iter().next().ok_or(WalletError::NoAccounts)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::mock::{account, serve_json_rpc, MockProvider, ACCOUNT};
    use crate::api::provider::InjectionPoint;
    use crate::api::rpc::JsonRpcProvider;
    use crate::models::transaction::{recipient, TRANSFER_GAS_LIMIT};
    use serde_json::json;
    use std::time::Duration;

    /// Attend (max 2s) qu'une condition devienne vraie
    pub(crate) async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    fn test_config() -> Config {
        Config {
            poll_interval: Duration::from_millis(10),
            confirmation_timeout: Duration::from_secs(1),
            ..Config::default()
        }
    }

    fn controller_with(mock: &Arc<MockProvider>) -> (WalletSessionController, mpsc::Receiver<Session>) {
        let (tx, rx) = mpsc::channel();
        (WalletSessionController::new(Some(mock.handle()), test_config(), tx), rx)
    }

    #[tokio::test]
    async fn test_connect_success() {
        let mock = Arc::new(MockProvider::new());
        let (mut controller, _rx) = controller_with(&mock);

        let session = controller.connect().await;

        assert!(session.connected);
        assert_eq!(session.balance.as_deref(), Some("1000000000000000000"));
        assert!(session.status_text().contains("Connected"));
        assert!(session.status_text().contains(ACCOUNT));
        assert!(controller.is_subscribed());
        assert_eq!(mock.calls()[0], "eth_requestAccounts");
        assert_eq!(mock.calls()[1], "eth_getBalance");
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let mock = Arc::new(MockProvider::rejecting());
        let (mut controller, _rx) = controller_with(&mock);

        let session = controller.connect().await;

        assert!(!session.connected);
        assert!(session.status_text().contains("❌"));
        assert!(session.status_text().contains("rejected"));
        assert!(!controller.is_subscribed());
        assert!(!mock.calls().iter().any(|c| c == "eth_getBalance"));
    }

    #[tokio::test]
    async fn test_connect_without_accounts() {
        let mock = Arc::new(MockProvider::new().with_accounts(Vec::new()));
        let (mut controller, _rx) = controller_with(&mock);

        let session = controller.connect().await;

        assert!(!session.connected);
        assert!(session.status_text().contains("no authorized account"));
    }

    #[tokio::test]
    async fn test_no_provider_never_connects() {
        let (tx, _rx) = mpsc::channel();
        let mut controller = WalletSessionController::new(None, test_config(), tx);

        assert!(!controller.has_provider());

        let session = controller.connect().await;
        assert!(!session.connected);
        assert!(session.status_text().contains("no wallet provider"));

        assert!(controller.send_transaction().await.is_none());
        assert!(!controller.session().connected);
        assert!(!controller.is_subscribed());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_releases_subscription() {
        let mock = Arc::new(MockProvider::new());
        let (mut controller, _rx) = controller_with(&mock);

        // Sans connexion préalable
        assert!(!controller.disconnect().connected);

        controller.connect().await;
        assert!(controller.session().connected);

        let session = controller.disconnect();
        assert!(!session.connected);
        assert!(!controller.is_subscribed());
        assert!(wait_until(|| mock.calls().iter().any(|c| c == "eth_uninstallFilter")).await);

        assert!(!controller.disconnect().connected);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_subscription() {
        let mock = Arc::new(MockProvider::new());
        let (mut controller, _rx) = controller_with(&mock);

        controller.connect().await;
        assert!(wait_until(|| mock.calls().iter().any(|c| c == "eth_newPendingTransactionFilter")).await);

        controller.connect().await;
        assert!(controller.session().connected);
        assert!(controller.is_subscribed());

        // L'abonnement précédent a été libéré
        assert!(wait_until(|| mock.calls().iter().any(|c| c == "eth_uninstallFilter")).await);
        assert_eq!(
            mock.calls().iter().filter(|c| *c == "eth_requestAccounts").count(),
            2
        );
    }

    #[tokio::test]
    async fn test_send_transaction_builds_fixed_transfer() {
        let mock = Arc::new(MockProvider::new().with_receipt(42, true));
        let (controller, _rx) = controller_with(&mock);

        // Pas besoin d'être connecté : seul le provider compte
        let watcher = controller.send_transaction().await.unwrap();
        watcher.await.unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, account());
        assert_eq!(sent[0].to, recipient().unwrap());
        assert_eq!(sent[0].value, U256::from(10_000_000_000_000_000u64));
        assert_eq!(sent[0].gas, TRANSFER_GAS_LIMIT);

        let session = controller.session();
        assert_eq!(session.status, Some(StatusMessage::Confirmed(42)));
        assert!(!session.connected);
    }

    #[tokio::test]
    async fn test_send_transaction_same_transfer_regardless_of_balance() {
        for balance in [U256::ZERO, U256::from(1), U256::MAX] {
            let mock = Arc::new(MockProvider::new().with_balance(balance).with_receipt(1, true));
            let (controller, _rx) = controller_with(&mock);

            controller.send_transaction().await.unwrap().await.unwrap();

            let sent = mock.sent();
            assert_eq!(sent[0].to, recipient().unwrap());
            assert_eq!(sent[0].value, U256::from(10_000_000_000_000_000u64));
            assert_eq!(sent[0].gas, 21_000);
        }
    }

    #[tokio::test]
    async fn test_send_transaction_failure() {
        let mock = Arc::new(MockProvider::new().failing_send());
        let (mut controller, _rx) = controller_with(&mock);
        controller.connect().await;

        assert!(controller.send_transaction().await.is_none());

        let session = controller.session();
        assert!(session.status_text().starts_with("❌ Transaction failed"));
        assert!(session.connected);
    }

    #[tokio::test]
    async fn test_updates_flow_to_presentation_channel() {
        let mock = Arc::new(MockProvider::new());
        let (mut controller, rx) = controller_with(&mock);

        controller.connect().await;
        controller.disconnect();

        let updates: Vec<Session> = rx.try_iter().collect();
        assert_eq!(updates.first().and_then(|s| s.status.clone()), Some(StatusMessage::Connecting));
        assert!(updates.iter().any(|s| s.connected));
        assert!(!updates.last().unwrap().connected);
    }

    #[tokio::test]
    async fn test_connect_with_balance_above_u128() {
        let balance = U256::MAX - U256::from(8);
        let mock = Arc::new(MockProvider::new().with_balance(balance));
        let (mut controller, _rx) = controller_with(&mock);

        let session = controller.connect().await;

        assert!(session.connected);
        assert_eq!(session.balance, Some(balance.to_string()));
    }

    #[tokio::test]
    async fn test_connect_over_http_with_dev_node_balance() {
        let (endpoint, server) = serve_json_rpc(vec![
            ("200 OK", json!({"jsonrpc": "2.0", "id": 1, "result": [ACCOUNT]}).to_string()),
            (
                "200 OK",
                json!({"jsonrpc": "2.0", "id": 2, "result": format!("0x{}7", "f".repeat(63))}).to_string(),
            ),
        ])
        .await;
        let provider = JsonRpcProvider::new(&endpoint, Duration::from_secs(5)).unwrap();
        let handle = ProviderHandle::new(InjectionPoint::Modern, endpoint, Arc::new(provider));
        let (tx, _rx) = mpsc::channel();
        let mut controller = WalletSessionController::new(Some(handle), test_config(), tx);

        let session = controller.connect().await;

        assert!(session.connected);
        assert_eq!(session.account, Some(account()));
        assert_eq!(
            session.balance.as_deref(),
            Some("115792089237316195423570985008687907853269984665640564039457584007913129639927")
        );

        let requests = server.await.unwrap();
        assert!(requests[0].contains("eth_requestAccounts"));
        assert!(requests[1].contains("eth_getBalance"));

        controller.disconnect();
    }

    #[test]
    fn test_channel_order_matches_replacement_order() {
        let (tx, rx) = mpsc::channel();
        let publisher = SessionPublisher::new(tx);

        let writers: Vec<_> = (0..4u64)
            .map(|writer| {
                let publisher = publisher.clone();
                std::thread::spawn(move || {
                    for n in 0..250 {
                        publisher.set_status(StatusMessage::Confirmed(writer * 1_000 + n));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let received: Vec<Session> = rx.try_iter().collect();
        assert_eq!(received.len(), 1_000);
        assert_eq!(received.last().unwrap().status, publisher.snapshot().status);

        // Chaque écrivain voit ses propres messages dans l'ordre
        for writer in 0..4u64 {
            let blocks: Vec<u64> = received
                .iter()
                .filter_map(|s| match s.status {
                    Some(StatusMessage::Confirmed(block)) if block / 1_000 == writer => Some(block),
                    _ => None,
                })
                .collect();
            assert!(blocks.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
