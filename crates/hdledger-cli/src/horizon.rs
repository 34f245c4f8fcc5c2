//! Horizon-backed ledger lookup.
//!
//! `GET {horizon}/accounts/{id}`: a 404 means the account was never
//! created, any other non-2xx status is a failure carrying the problem
//! title.

use async_trait::async_trait;
use hdledger_wallet::{AccountStatus, LedgerLookup, LookupError};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Horizon HTTP client.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    balances: Vec<BalanceLine>,
}

#[derive(Debug, Deserialize)]
struct BalanceLine {
    asset_type: String,
    balance: String,
}

/// Problem document returned with error statuses.
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: String,
}

impl HorizonClient {
    /// Create a client with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn account_url(&self, account_id: &str) -> String {
        format!("{}/accounts/{}", self.url, account_id)
    }
}

#[async_trait]
impl LedgerLookup for HorizonClient {
    async fn lookup(&self, account_id: &str) -> Result<AccountStatus, LookupError> {
        let response = self
            .client
            .get(self.account_url(account_id))
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Account {} not found", account_id);
            return Ok(AccountStatus::unused());
        }
        if !status.is_success() {
            let problem: Problem = response.json().await.unwrap_or_default();
            return Err(LookupError::Rejected {
                status: status.as_u16(),
                message: problem.title,
            });
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        let balance = match account.balances.iter().find(|b| b.asset_type == "native") {
            Some(line) => whole_units(&line.balance)?,
            None => 0,
        };
        tracing::debug!("Account {} holds {}", account_id, balance);
        Ok(AccountStatus::funded(balance))
    }
}

/// Integer part of a decimal amount such as `"123.4500000"`, saturating at
/// `u32::MAX`.
pub fn whole_units(amount: &str) -> Result<u32, LookupError> {
    let integer = amount.split('.').next().unwrap_or_default();
    if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LookupError::Malformed(format!(
            "invalid balance '{}'",
            amount
        )));
    }
    // only digits remain, so a parse failure is an overflow
    let value = integer.parse::<u64>().unwrap_or(u64::MAX);
    Ok(value.min(u32::MAX as u64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    fn client(server: &MockServer) -> HorizonClient {
        HorizonClient::new(server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_whole_units() {
        assert_eq!(whole_units("300.0000000").unwrap(), 300);
        assert_eq!(whole_units("0.9999999").unwrap(), 0);
        assert_eq!(whole_units("42").unwrap(), 42);
        assert_eq!(whole_units("99999999999.0").unwrap(), u32::MAX);
        assert_eq!(
            whole_units("184467440737095516160.0").unwrap(),
            u32::MAX
        );
        assert!(whole_units("").is_err());
        assert!(whole_units(".5").is_err());
        assert!(whole_units("-1.0").is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HorizonClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.account_url("GA"),
            "http://localhost:8000/accounts/GA"
        );
    }

    #[tokio::test]
    async fn test_funded_account() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/accounts/{}", ACCOUNT));
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "id": ACCOUNT,
                            "balances": [
                                {"asset_type": "credit_alphanum4", "balance": "7.0000000"},
                                {"asset_type": "native", "balance": "300.5000000"}
                            ]
                        })
                        .to_string(),
                    );
            })
            .await;

        let status = client(&server).lookup(ACCOUNT).await.unwrap();
        mock.assert_async().await;
        assert_eq!(status, AccountStatus::funded(300));
        assert!(status.is_funded());
    }

    #[tokio::test]
    async fn test_account_without_native_balance() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/accounts/{}", ACCOUNT));
                then.status(200).body(json!({"balances": []}).to_string());
            })
            .await;

        let status = client(&server).lookup(ACCOUNT).await.unwrap();
        assert_eq!(status, AccountStatus::empty());
        assert!(status.valid);
    }

    #[tokio::test]
    async fn test_missing_account_is_unused() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/accounts/{}", ACCOUNT));
                then.status(404)
                    .body(json!({"title": "Resource Missing", "status": 404}).to_string());
            })
            .await;

        let status = client(&server).lookup(ACCOUNT).await.unwrap();
        assert_eq!(status, AccountStatus::unused());
    }

    #[tokio::test]
    async fn test_server_error_carries_title() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/accounts/{}", ACCOUNT));
                then.status(503)
                    .body(json!({"title": "Service Unavailable", "status": 503}).to_string());
            })
            .await;

        let err = client(&server).lookup(ACCOUNT).await.unwrap_err();
        assert_eq!(
            err,
            LookupError::Rejected {
                status: 503,
                message: "Service Unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/accounts/{}", ACCOUNT));
                then.status(200).body("not json");
            })
            .await;

        let err = client(&server).lookup(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, LookupError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HorizonClient::new(
            format!("http://127.0.0.1:{}", port),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.lookup(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }
}
