// ============================================================================
// MockProvider : wallet provider scripté pour les tests
// ============================================================================
// Chaque appel est enregistré (nom de méthode JSON-RPC) pour pouvoir vérifier
// qu'aucun appel réseau n'a eu lieu, ou dans quel ordre ils ont eu lieu.
//
// serve_json_rpc : faux endpoint HTTP qui rejoue des réponses préparées,
// pour tester JsonRpcProvider sur une vraie connexion.
// ============================================================================

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::api::error::WalletError;
use crate::api::provider::{FilterId, InjectionPoint, ProviderHandle, WalletProvider};
use crate::models::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};

pub const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

pub fn account() -> Address {
    ACCOUNT.parse().unwrap()
}

pub fn tx_hash(byte: u8) -> TxHash {
    TxHash::repeat_byte(byte)
}

pub struct MockProvider {
    accounts: Vec<Address>,
    reject_authorization: bool,
    balance: U256,
    fail_send: bool,
    receipt: Option<TransactionReceipt>,
    pending: Mutex<VecDeque<Vec<TxHash>>>,
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl MockProvider {
    /// Provider qui autorise ACCOUNT avec un solde de 1 ether
    pub fn new() -> Self {
        Self {
            accounts: vec![account()],
            reject_authorization: false,
            balance: U256::from(1_000_000_000_000_000_000u64),
            fail_send: false,
            receipt: None,
            pending: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject_authorization: true,
            ..Self::new()
        }
    }

    pub fn with_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn with_receipt(mut self, block_number: u64, success: bool) -> Self {
        self.receipt = Some(TransactionReceipt {
            transaction_hash: tx_hash(0xaa),
            block_number,
            success,
        });
        self
    }

    /// Ajoute un lot de hashes renvoyé par le prochain eth_getFilterChanges
    pub fn push_pending(&self, hashes: Vec<TxHash>) {
        self.pending.lock().unwrap().push_back(hashes);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn handle(self: &Arc<Self>) -> ProviderHandle {
        ProviderHandle::new(InjectionPoint::Modern, "mock://wallet", Arc::clone(self) as Arc<dyn WalletProvider>)
    }

    fn record(&self, method: &str) {
        self.calls.lock().unwrap().push(method.to_string());
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.record("eth_requestAccounts");
        if self.reject_authorization {
            return Err(WalletError::Rejected("User rejected the request.".to_string()));
        }
        Ok(self.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.record("eth_accounts");
        Ok(self.accounts.clone())
    }

    async fn balance(&self, _account: &Address) -> Result<U256, WalletError> {
        self.record("eth_getBalance");
        Ok(self.balance)
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, WalletError> {
        self.record("eth_sendTransaction");
        self.sent.lock().unwrap().push(tx.clone());
        if self.fail_send {
            return Err(WalletError::Rpc {
                code: -32000,
                message: "insufficient funds".to_string(),
            });
        }
        Ok(tx_hash(0xaa))
    }

    async fn transaction_receipt(&self, _hash: &TxHash) -> Result<Option<TransactionReceipt>, WalletError> {
        self.record("eth_getTransactionReceipt");
        Ok(self.receipt.clone())
    }

    async fn new_pending_transaction_filter(&self) -> Result<FilterId, WalletError> {
        self.record("eth_newPendingTransactionFilter");
        Ok("0x1".to_string())
    }

    async fn filter_changes(&self, _filter: &FilterId) -> Result<Vec<TxHash>, WalletError> {
        self.record("eth_getFilterChanges");
        Ok(self.pending.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn uninstall_filter(&self, _filter: &FilterId) -> Result<bool, WalletError> {
        self.record("eth_uninstallFilter");
        Ok(true)
    }
}

// ============================================================================
// Faux endpoint JSON-RPC
// ============================================================================

/// Réponse HTTP préparée : ligne de statut ("200 OK") + corps
pub type CannedResponse = (&'static str, String);

/// Écoute sur un port libre et répond, une connexion par réponse, dans l'ordre
///
/// Retourne l'URL de l'endpoint et une tâche qui rend les requêtes reçues.
/// Après la dernière réponse, le listener est fermé (connexion refusée).
pub async fn serve_json_rpc(responses: Vec<CannedResponse>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        requests
    });

    (endpoint, server)
}

/// Lit une requête HTTP complète (en-têtes + corps selon Content-Length)
async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if text.len() >= end + 4 + length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}
