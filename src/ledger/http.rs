use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::error::LedgerError;
use crate::identity::Identity;

use super::{DeployRequest, InvokeRequest, LedgerClient, Receipt, RequestOptions};

const USER_AGENT: &str = concat!("ledgerbench/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_PREFIX: &str = "v1";

/// Client for a JSON-over-HTTP ledger gateway.
///
/// Every operation is a `POST {host}/v1/{operation}`; the gateway answers with
/// `{"txid": .., "payload": ..}` or `{"error": ".."}`.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    client: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    txid: Option<String>,
    #[serde(default)]
    payload: Value,
    error: Option<String>,
}

impl HttpLedgerClient {
    /// Builds a client for `host`. No request is sent until the first call.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is not an http(s) URL or the HTTP
    /// client cannot be built.
    pub fn connect(host: &str) -> Result<Self, LedgerError> {
        let base = Url::parse(host).map_err(|err| LedgerError::InvalidHost {
            host: host.to_owned(),
            source: err,
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(LedgerError::UnsupportedScheme {
                scheme: base.scheme().to_owned(),
            });
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .tcp_nodelay(true)
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, operation: &str) -> Result<Url, LedgerError> {
        let raw = format!(
            "{}/{}/{}",
            self.base.as_str().trim_end_matches('/'),
            API_PREFIX,
            operation
        );
        Url::parse(&raw).map_err(|err| LedgerError::InvalidHost {
            host: raw.clone(),
            source: err,
        })
    }

    async fn submit(&self, operation: &'static str, body: Value) -> Result<Receipt, LedgerError> {
        let url = self.endpoint(operation)?;
        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::trace!("{} -> {} {}", operation, status, text);

        let envelope: GatewayResponse =
            serde_json::from_str(&text).map_err(|err| LedgerError::MalformedResponse {
                message: format!("{} (status {}): {}", operation, status, err),
            })?;
        if let Some(message) = envelope.error {
            return Err(LedgerError::from_message(&message));
        }
        if !status.is_success() {
            return Err(LedgerError::Rejected {
                message: format!("{} returned status {}", operation, status),
            });
        }
        let tx_id = envelope
            .txid
            .ok_or_else(|| LedgerError::MalformedResponse {
                message: format!("{} response has no txid", operation),
            })?;
        Ok(Receipt {
            tx_id,
            payload: envelope.payload,
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn create_contract_account(
        &self,
        from: &Identity,
        account: &str,
    ) -> Result<Receipt, LedgerError> {
        let body = json!({
            "initiator": from.address(),
            "account": account,
        });
        self.submit("account/create", body).await
    }

    async fn transfer(
        &self,
        from: &Identity,
        to: &str,
        amount: &str,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let body = json!({
            "initiator": from.address(),
            "to": to,
            "amount": amount,
            "post": opts.post,
        });
        self.submit("transfer", body).await
    }

    async fn deploy(
        &self,
        from: &Identity,
        request: DeployRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let body = json!({
            "initiator": from.address(),
            "contract_account": from.contract_account(),
            "module": request.module,
            "name": request.name,
            "code": B64.encode(request.code),
            "args": request.args,
            "runtime": request.runtime,
            "post": opts.post,
        });
        self.submit("contract/deploy", body).await
    }

    async fn invoke(
        &self,
        from: &Identity,
        request: InvokeRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        self.submit("contract/invoke", call_body(from, &request, opts))
            .await
    }

    async fn query(
        &self,
        from: &Identity,
        request: InvokeRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        self.submit("contract/query", call_body(from, &request, opts))
            .await
    }
}

fn call_body(from: &Identity, request: &InvokeRequest<'_>, opts: RequestOptions) -> Value {
    json!({
        "initiator": from.address(),
        "module": request.module,
        "name": request.name,
        "method": request.method,
        "args": request.args,
        "post": opts.post,
    })
}
