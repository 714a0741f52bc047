// ============================================================================
// API Client : JSON-RPC 2.0 sur HTTP
// ============================================================================
// Implémente WalletProvider en parlant à un endpoint JSON-RPC (wallet local,
// nœud de dev, proxy d'extension...).
//
// Format d'une requête :
//   {"jsonrpc":"2.0","id":1,"method":"eth_getBalance","params":["0x..","latest"]}
// Format d'une réponse :
//   {"jsonrpc":"2.0","id":1,"result":"0xde0b6b3a7640000"}
//   {"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected"}}
//
// CONCEPTS RUST :
// 1. Génériques + serde : call<P, R>() sérialise P et désérialise R
// 2. AtomicU64 : compteur d'id partagé sans Mutex
// 3. #[instrument] : span tracing par appel, avec le nom de la méthode
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::U64;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};

use crate::api::error::WalletError;
use crate::api::provider::{FilterId, WalletProvider};
use crate::models::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};

// ============================================================================
// Enveloppes JSON-RPC
// ============================================================================

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Reçu brut tel que renvoyé par eth_getTransactionReceipt
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    block_number: Option<U64>,
    status: Option<U64>,
}

impl RawReceipt {
    /// None si le reçu n'a pas encore de bloc
    fn into_receipt(self) -> Option<TransactionReceipt> {
        let block = self.block_number?;

        Some(TransactionReceipt {
            transaction_hash: self.transaction_hash,
            block_number: block.to::<u64>(),
            // Les reçus pré-Byzantium n'ont pas de status : succès par défaut
            success: self.status != Some(U64::ZERO),
        })
    }
}

/// Extrait le résultat typé d'une réponse JSON-RPC
fn decode_response<R: DeserializeOwned>(response: RpcResponse) -> Result<R, WalletError> {
    if let Some(err) = response.error {
        return Err(WalletError::from_rpc(err.code, err.message));
    }

    // Un "result": null est valide (ex : reçu pas encore disponible)
    let value = response.result.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| WalletError::InvalidResponse(e.to_string()))
}

// ============================================================================
// JsonRpcProvider
// ============================================================================

/// Client JSON-RPC vers le wallet provider
pub struct JsonRpcProvider {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    /// Crée le client HTTP ; chaque requête est limitée par `timeout`
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("myblock/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Envoie une requête JSON-RPC et désérialise le résultat
    #[instrument(skip(self, params), fields(endpoint = %self.endpoint))]
    async fn call<P, R>(&self, method: &str, params: P) -> Result<R, WalletError>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(id, "Sending JSON-RPC request");
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(id, status = %status, bytes = body.len(), "Received JSON-RPC response");

        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                error!(status = %status, "Provider returned error status");
                return Err(WalletError::InvalidResponse(format!("HTTP {}", status)));
            }
            Err(e) => {
                warn!(error = %e, "Malformed JSON-RPC response");
                return Err(WalletError::InvalidResponse(e.to_string()));
            }
        };

        decode_response(parsed)
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.call("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.call("eth_accounts", json!([])).await
    }

    async fn balance(&self, account: &Address) -> Result<U256, WalletError> {
        self.call("eth_getBalance", json!([account, "latest"])).await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, WalletError> {
        self.call("eth_sendTransaction", json!([tx])).await
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, WalletError> {
        let raw: Option<RawReceipt> = self.call("eth_getTransactionReceipt", json!([hash])).await?;
        Ok(raw.and_then(RawReceipt::into_receipt))
    }

    async fn new_pending_transaction_filter(&self) -> Result<FilterId, WalletError> {
        self.call("eth_newPendingTransactionFilter", json!([])).await
    }

    async fn filter_changes(&self, filter: &FilterId) -> Result<Vec<TxHash>, WalletError> {
        self.call("eth_getFilterChanges", json!([filter])).await
    }

    async fn uninstall_filter(&self, filter: &FilterId) -> Result<bool, WalletError> {
        self.call("eth_uninstallFilter", json!([filter])).await
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{account, serve_json_rpc};

    fn parse(body: &str) -> RpcResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_request_envelope() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_requestAccounts",
            params: json!([]),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "method": "eth_requestAccounts", "params": []}));
    }

    #[test]
    fn test_decode_accounts() {
        let response = parse(r#"{"jsonrpc":"2.0","id":1,"result":["0x1111111111111111111111111111111111111111"]}"#);
        let accounts: Vec<Address> = decode_response(response).unwrap();

        assert_eq!(accounts, vec![account()]);
    }

    #[test]
    fn test_decode_user_rejection() {
        let response = parse(r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected the request."}}"#);
        let result: Result<Vec<Address>, _> = decode_response(response);

        assert!(matches!(result, Err(WalletError::Rejected(_))));
    }

    #[test]
    fn test_decode_wrong_type_is_invalid_response() {
        let response = parse(r#"{"jsonrpc":"2.0","id":1,"result":"0x1234"}"#);
        let result: Result<Vec<Address>, _> = decode_response(response);

        assert!(matches!(result, Err(WalletError::InvalidResponse(_))));
    }

    #[test]
    fn test_decode_null_receipt() {
        let response = parse(r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        let raw: Option<RawReceipt> = decode_response(response).unwrap();

        assert!(raw.is_none());
    }

    #[test]
    fn test_receipt_conversion() {
        let hash = format!("0x{}", "cd".repeat(32));
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"transactionHash": hash, "blockNumber": "0x10", "status": "0x1"}
        })
        .to_string();

        let raw: Option<RawReceipt> = decode_response(parse(&body)).unwrap();
        let receipt = raw.unwrap().into_receipt().unwrap();

        assert_eq!(receipt.block_number, 16);
        assert!(receipt.success);
        assert_eq!(receipt.transaction_hash, TxHash::repeat_byte(0xcd));
    }

    #[test]
    fn test_reverted_and_pending_receipts() {
        let hash = TxHash::repeat_byte(0xef);

        let reverted = RawReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(0x2a)),
            status: Some(U64::ZERO),
        };
        assert!(!reverted.into_receipt().unwrap().success);

        let pending = RawReceipt {
            transaction_hash: hash,
            block_number: None,
            status: None,
        };
        assert!(pending.into_receipt().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) : rien n'écoute, la connexion échoue vite
        let provider = JsonRpcProvider::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = provider.accounts().await;

        assert!(matches!(result, Err(WalletError::Transport(_))));
    }

    // ========================================================================
    // Sur une vraie connexion HTTP
    // ========================================================================

    fn result_body(result: Value) -> String {
        json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
    }

    #[tokio::test]
    async fn test_balance_above_u128_over_http() {
        // 2^256 - 9 wei : solde du compte de dev de geth --dev
        let quantity = format!("0x{}7", "f".repeat(63));
        let (endpoint, server) = serve_json_rpc(vec![("200 OK", result_body(json!(quantity)))]).await;
        let provider = JsonRpcProvider::new(&endpoint, Duration::from_secs(5)).unwrap();

        let balance = provider.balance(&account()).await.unwrap();

        assert_eq!(balance, U256::MAX - U256::from(8));
        assert_eq!(
            balance.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639927"
        );

        let requests = server.await.unwrap();
        assert!(requests[0].contains("\"eth_getBalance\""));
        assert!(requests[0].contains("\"latest\""));
    }

    #[tokio::test]
    async fn test_http_error_status_without_json() {
        let (endpoint, _server) =
            serve_json_rpc(vec![("502 Bad Gateway", "upstream unavailable".to_string())]).await;
        let provider = JsonRpcProvider::new(&endpoint, Duration::from_secs(5)).unwrap();

        match provider.accounts().await {
            Err(WalletError::InvalidResponse(message)) => assert!(message.contains("502")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_objects_over_http() {
        let rejected = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": 4001, "message": "User rejected"}});
        let funds = json!({"jsonrpc": "2.0", "id": 2, "error": {"code": -32000, "message": "insufficient funds"}});
        let (endpoint, _server) = serve_json_rpc(vec![
            ("200 OK", rejected.to_string()),
            // Certains nœuds renvoient l'objet d'erreur avec un statut 500
            ("500 Internal Server Error", funds.to_string()),
        ])
        .await;
        let provider = JsonRpcProvider::new(&endpoint, Duration::from_secs(5)).unwrap();

        assert!(matches!(provider.request_accounts().await, Err(WalletError::Rejected(_))));

        let tx = TransactionRequest::fixed_transfer(account()).unwrap();
        match provider.send_transaction(&tx).await {
            Err(WalletError::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "insufficient funds");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receipt_over_http() {
        let receipt = json!({"transactionHash": tx_hash_hex(), "blockNumber": "0x1b4", "status": "0x1"});
        let (endpoint, _server) = serve_json_rpc(vec![
            ("200 OK", result_body(Value::Null)),
            ("200 OK", result_body(receipt)),
        ])
        .await;
        let provider = JsonRpcProvider::new(&endpoint, Duration::from_secs(5)).unwrap();
        let hash = TxHash::repeat_byte(0xaa);

        assert_eq!(provider.transaction_receipt(&hash).await.unwrap(), None);

        let mined = provider.transaction_receipt(&hash).await.unwrap().unwrap();
        assert_eq!(mined.block_number, 436);
        assert!(mined.success);
    }

    fn tx_hash_hex() -> String {
        format!("0x{}", "aa".repeat(32))
    }
}
