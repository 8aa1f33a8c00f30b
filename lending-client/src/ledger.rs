//! Interfaces to the network and to the wallet.
//!
//! [`Ledger`] covers the handful of RPC calls this crate makes.  With the
//! `rpc` feature it is implemented for Solana’s non-blocking `RpcClient`;
//! tests use an in-memory implementation.  [`Wallet`] signs transactions on
//! behalf of the fee payer.

use solana_program::pubkey::Pubkey;
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

use crate::Result;


/// Read and write access to the chain.
#[async_trait::async_trait]
pub trait Ledger: Sync {
    /// Returns address and raw data of every token account owned by `owner`
    /// holding `mint`.
    ///
    /// Ordering of the result is up to the node.
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;

    /// Returns a recent blockhash to attach to a transaction.
    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Submits signed transaction without preflight checks.
    ///
    /// Returns as soon as the node accepts the transaction; it may still fail
    /// or never land.
    async fn send_transaction(&self, transaction: &Transaction)
        -> Result<Signature>;

    /// Waits until the transaction is confirmed.
    ///
    /// Fails with [`crate::Error::Rejected`] if the transaction failed and
    /// with [`crate::Error::Expired`] if `blockhash` expired before the
    /// transaction landed.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
    ) -> Result;
}


/// Holder of the fee payer’s key.
#[async_trait::async_trait]
pub trait Wallet: Sync {
    /// Address of the fee payer.
    fn pubkey(&self) -> Pubkey;

    /// Adds fee payer’s signature to the transaction.
    ///
    /// Transaction may already be partially signed by other signers; those
    /// signatures must be preserved.
    async fn sign_transaction(&self, transaction: Transaction)
        -> Result<Transaction>;
}

#[async_trait::async_trait]
impl Wallet for Keypair {
    fn pubkey(&self) -> Pubkey { Signer::pubkey(self) }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[self], blockhash)?;
        Ok(transaction)
    }
}


#[cfg(feature = "rpc")]
mod rpc {
    use core::str::FromStr;
    use core::time::Duration;

    use solana_client::nonblocking::rpc_client::RpcClient;
    use solana_client::rpc_config::RpcSendTransactionConfig;
    use solana_client::rpc_request::RpcRequest;
    use solana_client::rpc_response::{Response, RpcKeyedAccount};

    use super::*;
    use crate::Error;

    /// How often signature status is polled while waiting for confirmation.
    const POLL_INTERVAL: Duration = Duration::from_millis(500);

    #[async_trait::async_trait]
    impl Ledger for RpcClient {
        async fn token_accounts_by_owner(
            &self,
            owner: &Pubkey,
            mint: &Pubkey,
        ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
            // RpcClient::get_token_accounts_by_owner requests jsonParsed
            // encoding; we want raw bytes.
            let params = serde_json::json!([
                owner.to_string(),
                { "mint": mint.to_string() },
                {
                    "encoding": "base64",
                    "commitment": self.commitment().commitment,
                },
            ]);
            let response: Response<Vec<RpcKeyedAccount>> =
                self.send(RpcRequest::GetTokenAccountsByOwner, params).await?;
            tracing::debug!(
                %owner, %mint, slot = response.context.slot,
                "got {} token accounts", response.value.len()
            );
            response
                .value
                .into_iter()
                .map(|keyed| -> Result<(Pubkey, Vec<u8>)> {
                    let pubkey = Pubkey::from_str(&keyed.pubkey)?;
                    let data = keyed
                        .account
                        .data
                        .decode()
                        .ok_or(Error::UndecodableAccountData(pubkey))?;
                    Ok((pubkey, data))
                })
                .collect()
        }

        async fn latest_blockhash(&self) -> Result<Hash> {
            Ok(self.get_latest_blockhash().await?)
        }

        async fn send_transaction(
            &self,
            transaction: &Transaction,
        ) -> Result<Signature> {
            let config = RpcSendTransactionConfig {
                skip_preflight: true,
                ..Default::default()
            };
            Ok(self.send_transaction_with_config(transaction, config).await?)
        }

        async fn confirm_transaction(
            &self,
            signature: &Signature,
            blockhash: &Hash,
        ) -> Result {
            let commitment = self.commitment();
            loop {
                let status = self
                    .get_signature_status_with_commitment(signature, commitment)
                    .await?;
                match status {
                    Some(Ok(())) => return Ok(()),
                    Some(Err(err)) => return Err(Error::Rejected(*signature, err)),
                    None => (),
                }
                if !self.is_blockhash_valid(blockhash, commitment).await? {
                    // The transaction may have landed between the two calls.
                    return match self
                        .get_signature_status_with_commitment(signature, commitment)
                        .await?
                    {
                        Some(Ok(())) => Ok(()),
                        Some(Err(err)) => Err(Error::Rejected(*signature, err)),
                        None => Err(Error::Expired(*signature)),
                    };
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }


    #[cfg(test)]
    mod tests {
        use std::collections::{HashMap, VecDeque};
        use std::sync::{Arc, Mutex};

        use base64::prelude::{Engine, BASE64_STANDARD};
        use pretty_assertions::assert_eq;
        use serde_json::{json, Value};
        use solana_client::client_error::{self, ClientErrorKind};
        use solana_client::rpc_client::RpcClientConfig;
        use solana_client::rpc_sender::{RpcSender, RpcTransportStats};
        use solana_sdk::commitment_config::CommitmentConfig;
        use solana_sdk::message::Message;
        use solana_sdk::transaction::TransactionError;

        use super::*;
        use crate::account::find_largest_token_account_for_owner;
        use crate::layout::TokenAccount;

        type Requests = Arc<Mutex<Vec<(RpcRequest, Value)>>>;

        /// RPC transport which answers from a script and records requests.
        #[derive(Default)]
        struct ScriptedSender {
            responses: Mutex<HashMap<RpcRequest, VecDeque<Value>>>,
            requests: Requests,
        }

        #[async_trait::async_trait]
        impl RpcSender for ScriptedSender {
            async fn send(
                &self,
                request: RpcRequest,
                params: Value,
            ) -> client_error::Result<Value> {
                self.requests.lock().unwrap().push((request, params));
                self.responses
                    .lock()
                    .unwrap()
                    .get_mut(&request)
                    .and_then(VecDeque::pop_front)
                    .ok_or_else(|| {
                        ClientErrorKind::Custom(format!("unexpected {request}"))
                            .into()
                    })
            }

            fn get_transport_stats(&self) -> RpcTransportStats {
                RpcTransportStats::default()
            }

            fn url(&self) -> String { "scripted".into() }
        }

        fn scripted_client(
            script: impl IntoIterator<Item = (RpcRequest, Value)>,
        ) -> (RpcClient, Requests) {
            let sender = ScriptedSender::default();
            {
                let mut responses = sender.responses.lock().unwrap();
                for (request, value) in script {
                    responses.entry(request).or_default().push_back(value);
                }
            }
            let requests = sender.requests.clone();
            let config =
                RpcClientConfig::with_commitment(CommitmentConfig::confirmed());
            (RpcClient::new_sender(sender, config), requests)
        }

        fn methods(requests: &Requests) -> Vec<RpcRequest> {
            requests.lock().unwrap().iter().map(|(req, _)| *req).collect()
        }

        fn context(value: Value) -> Value {
            json!({ "context": { "slot": 1 }, "value": value })
        }

        fn keyed_account(pubkey: &Pubkey, data: Value) -> Value {
            json!({
                "pubkey": pubkey.to_string(),
                "account": {
                    "lamports": 2039280,
                    "data": data,
                    "owner": spl_token::ID.to_string(),
                    "executable": false,
                    "rentEpoch": 0,
                    "space": TokenAccount::LEN,
                },
            })
        }

        fn status(err: Option<&str>) -> (RpcRequest, Value) {
            let result = match err {
                None => json!({ "Ok": null }),
                Some(err) => json!({ "Err": err }),
            };
            let status = json!({
                "slot": 1,
                "confirmations": null,
                "status": result,
                "err": err,
                "confirmationStatus": "finalized",
            });
            (RpcRequest::GetSignatureStatuses, context(json!([status])))
        }

        fn no_status() -> (RpcRequest, Value) {
            (RpcRequest::GetSignatureStatuses, context(json!([null])))
        }

        fn blockhash_valid(valid: bool) -> (RpcRequest, Value) {
            (RpcRequest::IsBlockhashValid, context(json!(valid)))
        }

        #[tokio::test]
        async fn test_token_accounts_by_owner() {
            let owner = Pubkey::new_unique();
            let mint = Pubkey::new_unique();
            let address = Pubkey::new_unique();
            let account = TokenAccount { mint, owner, amount: 42 };
            let data = BASE64_STANDARD.encode(account.to_bytes());
            let (client, requests) = scripted_client([(
                RpcRequest::GetTokenAccountsByOwner,
                context(json!([keyed_account(&address, json!([data, "base64"]))])),
            )]);

            let got = client.token_accounts_by_owner(&owner, &mint).await.unwrap();
            assert_eq!(vec![(address, account.to_bytes().to_vec())], got);

            let params = json!([
                owner.to_string(),
                { "mint": mint.to_string() },
                { "encoding": "base64", "commitment": "confirmed" },
            ]);
            assert_eq!(
                vec![(RpcRequest::GetTokenAccountsByOwner, params)],
                *requests.lock().unwrap()
            );
        }

        #[tokio::test]
        async fn test_token_accounts_undecodable_data() {
            let owner = Keypair::new();
            let mint = Pubkey::new_unique();
            let address = Pubkey::new_unique();
            let parsed = json!({
                "program": "spl-token",
                "parsed": { "type": "account" },
                "space": TokenAccount::LEN,
            });
            let response =
                context(json!([keyed_account(&address, parsed.clone())]));
            let (client, requests) = scripted_client([
                (RpcRequest::GetTokenAccountsByOwner, response.clone()),
                (RpcRequest::GetTokenAccountsByOwner, response),
            ]);

            let got = client
                .token_accounts_by_owner(&Wallet::pubkey(&owner), &mint)
                .await;
            assert!(matches!(
                got,
                Err(Error::UndecodableAccountData(key)) if key == address
            ));

            // The error reaches the caller and no account gets created.
            let got =
                find_largest_token_account_for_owner(&client, &owner, &mint).await;
            assert!(matches!(
                got,
                Err(Error::UndecodableAccountData(key)) if key == address
            ));
            assert_eq!(
                vec![RpcRequest::GetTokenAccountsByOwner; 2],
                methods(&requests)
            );
        }

        #[tokio::test]
        async fn test_send_transaction_skips_preflight() {
            let payer = Keypair::new();
            let ix = solana_system_interface::instruction::transfer(
                &Wallet::pubkey(&payer),
                &Pubkey::new_unique(),
                1,
            );
            let message = Message::new_with_blockhash(
                &[ix],
                Some(&Wallet::pubkey(&payer)),
                &Hash::new_unique(),
            );
            let tx = payer.sign_transaction(Transaction::new_unsigned(message))
                .await
                .unwrap();
            let signature = tx.signatures[0];
            let (client, requests) = scripted_client([(
                RpcRequest::SendTransaction,
                json!(signature.to_string()),
            )]);

            let got = Ledger::send_transaction(&client, &tx).await.unwrap();
            assert_eq!(signature, got);

            let requests = requests.lock().unwrap();
            assert_eq!(1, requests.len());
            let (request, params) = &requests[0];
            assert_eq!(RpcRequest::SendTransaction, *request);
            assert_eq!(json!(true), params[1]["skipPreflight"]);
            assert_eq!(json!("base64"), params[1]["encoding"]);
        }

        #[tokio::test]
        async fn test_confirm_immediately() {
            let signature = Signature::from([7; 64]);
            let (client, requests) = scripted_client([status(None)]);
            Ledger::confirm_transaction(&client, &signature, &Hash::new_unique())
                .await
                .unwrap();
            assert_eq!(vec![RpcRequest::GetSignatureStatuses], methods(&requests));
        }

        #[tokio::test]
        async fn test_confirm_rejected() {
            let signature = Signature::from([7; 64]);
            let (client, _) = scripted_client([status(Some("AccountInUse"))]);
            let got = Ledger::confirm_transaction(
                &client,
                &signature,
                &Hash::new_unique(),
            )
            .await;
            assert!(matches!(
                got,
                Err(Error::Rejected(sig, TransactionError::AccountInUse))
                    if sig == signature
            ));
        }

        #[tokio::test]
        async fn test_confirm_after_polling() {
            let signature = Signature::from([7; 64]);
            let blockhash = Hash::new_unique();
            let (client, requests) =
                scripted_client([no_status(), blockhash_valid(true), status(None)]);
            Ledger::confirm_transaction(&client, &signature, &blockhash)
                .await
                .unwrap();
            assert_eq!(
                vec![
                    RpcRequest::GetSignatureStatuses,
                    RpcRequest::IsBlockhashValid,
                    RpcRequest::GetSignatureStatuses,
                ],
                methods(&requests)
            );
            assert_eq!(
                json!(blockhash.to_string()),
                requests.lock().unwrap()[1].1[0]
            );
        }

        #[tokio::test]
        async fn test_confirm_expired() {
            let signature = Signature::from([7; 64]);
            let (client, requests) =
                scripted_client([no_status(), blockhash_valid(false), no_status()]);
            let got = Ledger::confirm_transaction(
                &client,
                &signature,
                &Hash::new_unique(),
            )
            .await;
            assert!(matches!(got, Err(Error::Expired(sig)) if sig == signature));
            assert_eq!(
                vec![
                    RpcRequest::GetSignatureStatuses,
                    RpcRequest::IsBlockhashValid,
                    RpcRequest::GetSignatureStatuses,
                ],
                methods(&requests)
            );
        }

        #[tokio::test]
        async fn test_confirm_landed_as_blockhash_expired() {
            let signature = Signature::from([7; 64]);
            let (client, _) =
                scripted_client([no_status(), blockhash_valid(false), status(None)]);
            Ledger::confirm_transaction(&client, &signature, &Hash::new_unique())
                .await
                .unwrap();

            let (client, _) = scripted_client([
                no_status(),
                blockhash_valid(false),
                status(Some("AccountInUse")),
            ]);
            let got = Ledger::confirm_transaction(
                &client,
                &signature,
                &Hash::new_unique(),
            )
            .await;
            assert!(matches!(got, Err(Error::Rejected(..))));
        }
    }
}
