// ============================================================================
// Structures : TransactionRequest, TransactionReceipt
// ============================================================================
// Le transfert unique que l'application sait envoyer, et le reçu attendu.
// Adresses, hashes et quantités viennent d'alloy-primitives : Address
// (20 octets), TxHash (B256) et U256 pour les montants en wei.
//
// CONCEPTS RUST :
// 1. Re-export : les types alloy font partie de l'API du module
// 2. FromStr : "0x...".parse::<Address>() valide la longueur et l'hexa
// 3. serialize_with : encodage personnalisé du gas en hexadécimal
// ============================================================================

use anyhow::{anyhow, Result};
use serde::{Serialize, Serializer};

pub use alloy_primitives::{Address, TxHash, U256};
use alloy_primitives::U64;

use crate::models::units::ether_to_wei;

/// Destinataire fixe du transfert
pub const RECIPIENT_ADDRESS: &str = "0xd5037F23Bf95073e340daa9EB89Bc1774e66Cd33";

/// Montant fixe du transfert, en ether
pub const TRANSFER_AMOUNT_ETHER: &str = "0.01";

/// Gas limit d'un transfert simple
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Adresse du destinataire fixe
pub fn recipient() -> Result<Address> {
    RECIPIENT_ADDRESS
        .parse()
        .map_err(|e| anyhow!("Adresse invalide {} : {}", RECIPIENT_ADDRESS, e))
}

// ============================================================================
// TransactionRequest
// ============================================================================
// CONCEPT : Le format JSON-RPC attend les quantités en hexadécimal
// - value : "0x2386f26fc10000" pour 0.01 ether (U256 le fait seul)
// - gas : "0x5208" pour 21000 (u64 passe par U64)
// ============================================================================

fn serialize_gas<S: Serializer>(gas: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    U64::from(*gas).serialize(serializer)
}

/// Transaction de transfert de valeur, prête pour eth_sendTransaction
///
/// Pas de nonce ni de gas price : c'est le provider qui les choisit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    /// Montant en wei
    pub value: U256,
    #[serde(serialize_with = "serialize_gas")]
    pub gas: u64,
}

impl TransactionRequest {
    /// Construit le transfert fixe : 0.01 ether vers RECIPIENT_ADDRESS, gas 21000
    ///
    /// Le solde de `from` n'est pas consulté : c'est le provider qui refusera
    /// une transaction non finançable.
    pub fn fixed_transfer(from: Address) -> Result<Self> {
        Ok(Self {
            from,
            to: recipient()?,
            value: ether_to_wei(TRANSFER_AMOUNT_ETHER)?,
            gas: TRANSFER_GAS_LIMIT,
        })
    }
}

/// Reçu d'une transaction minée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// false si la transaction a été revert (status 0x0)
    pub success: bool,
}

// ============================================================================
// Tests unitaires
// ============================================================================
