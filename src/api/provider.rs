// ============================================================================
// Wallet provider : trait + détection
// ============================================================================
// Le wallet provider est un collaborateur externe : c'est lui qui détient les
// clés, signe, choisit nonce et gas price. L'application ne fait que lui
// envoyer des requêtes (noms de méthodes EIP-1193 / JSON-RPC).
//
// Détection dans l'environnement hôte, par ordre de préférence :
// 1. ETHEREUM_PROVIDER_URL : point d'injection moderne
// 2. WEB3_PROVIDER_URL : point d'injection legacy
//
// CONCEPTS RUST :
// 1. #[async_trait] : méthodes async dans un trait utilisable en dyn
// 2. Arc<dyn WalletProvider> : provider partagé entre tâches tokio
// 3. Send + Sync : requis pour traverser les threads du runtime
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::api::error::WalletError;
use crate::api::rpc::JsonRpcProvider;
use crate::config::Config;
use crate::models::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};

pub const MODERN_PROVIDER_VAR: &str = "ETHEREUM_PROVIDER_URL";
pub const LEGACY_PROVIDER_VAR: &str = "WEB3_PROVIDER_URL";

/// Identifiant d'un filtre installé chez le provider
pub type FilterId = String;

/// Capacités attendues d'un wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// eth_requestAccounts : demande l'autorisation (peut être refusée)
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// eth_accounts : comptes déjà autorisés
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// eth_getBalance au bloc "latest", en wei
    async fn balance(&self, account: &Address) -> Result<U256, WalletError>;

    /// eth_sendTransaction : retourne le hash attribué
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, WalletError>;

    /// eth_getTransactionReceipt : None tant que la transaction n'est pas minée
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, WalletError>;

    /// eth_newPendingTransactionFilter
    async fn new_pending_transaction_filter(&self) -> Result<FilterId, WalletError>;

    /// eth_getFilterChanges : hashes arrivés depuis le dernier appel
    async fn filter_changes(&self, filter: &FilterId) -> Result<Vec<TxHash>, WalletError>;

    /// eth_uninstallFilter
    async fn uninstall_filter(&self, filter: &FilterId) -> Result<bool, WalletError>;
}

/// Point d'injection par lequel le provider a été trouvé
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    Modern,
    Legacy,
}

impl InjectionPoint {
    pub fn variable(&self) -> &'static str {
        match self {
            InjectionPoint::Modern => MODERN_PROVIDER_VAR,
            InjectionPoint::Legacy => LEGACY_PROVIDER_VAR,
        }
    }
}

/// Vue de l'environnement hôte, limitée aux points d'injection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    pub ethereum: Option<String>,
    pub web3: Option<String>,
}

impl HostEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Une variable vide compte comme absente
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            ethereum: read(MODERN_PROVIDER_VAR),
            web3: read(LEGACY_PROVIDER_VAR),
        }
    }

    /// Endpoint injecté, en préférant le point moderne
    pub fn injected_endpoint(&self) -> Option<(InjectionPoint, &str)> {
        self.ethereum
            .as_deref()
            .map(|url| (InjectionPoint::Modern, url))
            .or_else(|| self.web3.as_deref().map(|url| (InjectionPoint::Legacy, url)))
    }
}

/// Handle de capacité : preuve qu'un provider a été détecté
#[derive(Clone)]
pub struct ProviderHandle {
    pub injection: InjectionPoint,
    pub endpoint: String,
    provider: Arc<dyn WalletProvider>,
}

impl ProviderHandle {
    pub fn new(injection: InjectionPoint, endpoint: impl Into<String>, provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            injection,
            endpoint: endpoint.into(),
            provider,
        }
    }

    pub fn provider(&self) -> Arc<dyn WalletProvider> {
        Arc::clone(&self.provider)
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("injection", &self.injection)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Cherche un wallet provider injecté dans l'environnement hôte
///
/// Aucun appel réseau : on construit seulement le client.
pub fn detect_provider(env: &HostEnvironment, config: &Config) -> Option<ProviderHandle> {
    let Some((injection, endpoint)) = env.injected_endpoint() else {
        warn!("No wallet provider detected, you should consider installing MetaMask");
        return None;
    };

    match JsonRpcProvider::new(endpoint, config.request_timeout) {
        Ok(provider) => {
            info!(variable = injection.variable(), %endpoint, "Wallet provider detected");
            Some(ProviderHandle::new(injection, endpoint, Arc::new(provider)))
        }
        Err(e) => {
            error!(error = ?e, %endpoint, "Failed to build wallet provider client");
            None
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
