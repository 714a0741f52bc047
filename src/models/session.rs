// ============================================================================
// Structure : Session
// ============================================================================
// Snapshot immuable de l'état de la session wallet :
// - connected : un compte est-il autorisé ?
// - balance : solde du compte (en wei) au moment de la connexion
// - status : dernier message lisible pour l'utilisateur
//
// CONCEPT RUST : Immutabilité + remplacement complet
// - Chaque transition construit une NOUVELLE Session
// - L'ancienne n'est jamais modifiée sur place
// - Les snapshots voyagent par channel vers l'UI (flux unidirectionnel)
// ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::transaction::{Address, TxHash};

/// Message de statut affiché à l'utilisateur
///
/// CONCEPT RUST : Display sur un enum
/// - Le texte final est construit à l'affichage, pas stocké
/// - Les tests peuvent matcher sur le variant OU sur le texte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Connecting,
    Connected(Address),
    ConnectionFailed(String),
    PendingTransaction(TxHash),
    Sending,
    Sent(TxHash),
    Confirmed(u64),
    TransactionFailed(String),
    Error(String),
}

impl StatusMessage {
    /// Vrai pour les messages d'échec (affichés en rouge)
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusMessage::ConnectionFailed(_)
                | StatusMessage::TransactionFailed(_)
                | StatusMessage::Error(_)
        )
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Connecting => write!(f, "Connecting to wallet..."),
            StatusMessage::Connected(account) => write!(f, "✅ Connected! Account: {}", account),
            StatusMessage::ConnectionFailed(reason) => write!(f, "❌ Connection failed: {}", reason),
            StatusMessage::PendingTransaction(hash) => write!(f, "🟡 New transaction detected: {}", hash),
            StatusMessage::Sending => write!(f, "⏳ Sending transaction..."),
            StatusMessage::Sent(hash) => write!(f, "📡 Transaction sent!: {}", hash),
            StatusMessage::Confirmed(block) => write!(f, "✅ Transaction Confirmed! Block: {}", block),
            StatusMessage::TransactionFailed(reason) => write!(f, "❌ Transaction failed: {}", reason),
            StatusMessage::Error(reason) => write!(f, "❌ Error: {}", reason),
        }
    }
}

/// Snapshot de la session wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Un compte est autorisé
    pub connected: bool,

    /// Premier compte autorisé lors du dernier connect réussi
    pub account: Option<Address>,

    /// Solde du compte en wei, chaîne décimale ("1000000000000000000")
    /// Lu une seule fois par connect, pas de mise à jour en continu
    pub balance: Option<String>,

    /// Dernier message de statut
    pub status: Option<StatusMessage>,

    /// Date de création de ce snapshot
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Session initiale : déconnectée, sans message
    pub fn new() -> Self {
        Self {
            connected: false,
            account: None,
            balance: None,
            status: None,
            updated_at: Utc::now(),
        }
    }

    /// Transition vers l'état connecté
    ///
    /// Seul chemin vers `connected == true` : compte ET solde sont requis,
    /// donc "connecté" implique toujours "solde lu au moins une fois".
    pub fn connected(account: Address, balance: String) -> Self {
        Self {
            connected: true,
            status: Some(StatusMessage::Connected(account)),
            account: Some(account),
            balance: Some(balance),
            updated_at: Utc::now(),
        }
    }

    /// Transition vers l'état déconnecté
    ///
    /// Le compte, le solde et le statut sont conservés pour l'affichage.
    pub fn disconnected(&self) -> Self {
        Self {
            connected: false,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Nouveau snapshot avec un message de statut différent
    pub fn with_status(&self, status: StatusMessage) -> Self {
        Self {
            status: Some(status),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Texte du statut, vide s'il n'y en a pas
    pub fn status_text(&self) -> String {
        self.status.as_ref().map(|s| s.to_string()).unwrap_or_default()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
