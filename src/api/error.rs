// ============================================================================
// Erreurs du wallet provider
// ============================================================================
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère std::error::Error + Display
// - #[error("...")] : message affiché à l'utilisateur
// - #[from] : conversion automatique avec l'opérateur ?
// ============================================================================

use thiserror::Error;

use crate::models::TxHash;

/// Code EIP-1193 : l'utilisateur a refusé la requête
pub const USER_REJECTED_CODE: i64 = 4001;

/// Erreurs possibles lors d'un échange avec le wallet provider
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("no wallet provider detected")]
    NoProvider,

    #[error("request rejected by user: {0}")]
    Rejected(String),

    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("no authorized account")]
    NoAccounts,

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("no receipt for transaction {0} before timeout")]
    ConfirmationTimeout(TxHash),
}

impl WalletError {
    /// Construit l'erreur correspondant à un objet `error` JSON-RPC
    pub fn from_rpc(code: i64, message: String) -> Self {
        if code == USER_REJECTED_CODE {
            WalletError::Rejected(message)
        } else {
            WalletError::Rpc { code, message }
        }
    }
}
