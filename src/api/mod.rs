// ============================================================================
// Module : api
// ============================================================================
// Ce module contient tout ce qui parle au wallet provider externe :
// le trait WalletProvider, sa détection dans l'environnement hôte et le
// client JSON-RPC qui l'implémente.
// ============================================================================

pub mod error;    // WalletError (thiserror)
pub mod provider; // Trait WalletProvider + détection
pub mod rpc;      // Client JSON-RPC sur HTTP

#[cfg(test)]
pub mod mock;     // Provider scripté pour les tests

// Re-export des éléments principaux
pub use error::WalletError;
pub use provider::{detect_provider, HostEnvironment, InjectionPoint, ProviderHandle, WalletProvider};
pub use rpc::JsonRpcProvider;
