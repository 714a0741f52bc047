// ============================================================================
// MyBlock - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;        // Wallet provider : trait, détection, client JSON-RPC
pub mod app;        // État de présentation
pub mod config;     // Configuration (timeouts, logs)
pub mod controller; // Wallet Session Controller
pub mod models;     // Structures de données
pub mod ui;         // Interface utilisateur
