// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod session;     // Snapshot de session + messages de statut
pub mod transaction; // Adresses, hashes, transfert fixe
pub mod units;       // Affichage wei <-> ether

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use myblock::models::session::Session;
// On peut faire : use myblock::models::Session;
pub use session::{Session, StatusMessage};
pub use transaction::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};
