// ============================================================================
// Unités : wei <-> ether
// ============================================================================
// Les quantités on-chain sont des entiers 256 bits en wei (1 ether = 10^18
// wei). La conversion elle-même est déléguée à alloy-primitives ; ce module
// ne fait que l'adapter à l'affichage de l'application.
//
// CONCEPTS RUST :
// 1. U256 : entier non signé 256 bits (ruint), aucun solde ne déborde
// 2. map_err + anyhow! : erreurs de la librairie converties avec contexte
// ============================================================================

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;
use anyhow::{anyhow, Result};

/// Label court de l'ether pour l'affichage
pub const ETHER_LABEL: &str = "ETH";

/// Convertit un montant décimal en ether ("0.01") en wei
///
/// # Exemple
/// ```
/// use alloy_primitives::U256;
/// use myblock::models::units::ether_to_wei;
/// assert_eq!(ether_to_wei("0.01").unwrap(), U256::from(10_000_000_000_000_000u64));
/// ```
pub fn ether_to_wei(amount: &str) -> Result<U256> {
    let amount = amount.trim();
    parse_ether(amount).map_err(|e| anyhow!("Montant invalide {} : {}", amount, e))
}

/// Formate un montant en wei en ether, sans zéros inutiles
///
/// - 10^18 wei -> "1.0"
/// - 10^16 wei -> "0.01"
pub fn display_ether(wei: U256) -> String {
    let formatted = format_ether(wei);

    match formatted.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", integer)
            } else {
                format!("{}.{}", integer, fraction)
            }
        }
        None => format!("{}.0", formatted),
    }
}

/// Idem, depuis le solde décimal stocké dans la Session
///
/// None si la chaîne n'est pas un entier décimal valide.
pub fn display_ether_from_decimal(wei: &str) -> Option<String> {
    U256::from_str_radix(wei, 10).ok().map(display_ether)
}

// ============================================================================
// Tests unitaires
// ============================================================================
