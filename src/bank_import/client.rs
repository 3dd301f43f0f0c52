//! HTTP client for a Plaid-style bank aggregation API.

use std::{fmt, time::Duration as StdDuration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::UserId,
    bank_import::{AccessToken, BankAggregator, ExternalTransaction},
};

/// The aggregator's sandbox environment.
pub const DEFAULT_BANK_BASE_URL: &str = "https://sandbox.plaid.com";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// How far back transactions are fetched on import.
const IMPORT_WINDOW: Duration = Duration::days(30);

/// Where the aggregator lives and the credentials of this app.
#[derive(Clone)]
pub struct BankConfig {
    /// The aggregator's API root, e.g. [DEFAULT_BANK_BASE_URL].
    pub base_url: String,
    /// The app's client ID.
    pub client_id: String,
    /// The app's secret. Never sent to the browser.
    pub secret: String,
}

impl fmt::Debug for BankConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("secret", &"********")
            .finish()
    }
}

/// Talks to the aggregator with the app's client ID and secret.
///
/// The secret and any access tokens stay on the server.
#[derive(Debug, Clone)]
pub struct BankClient {
    http: reqwest::Client,
    config: BankConfig,
}

#[derive(Serialize)]
struct Credentials<'a> {
    client_id: &'a str,
    secret: &'a str,
}

#[derive(Serialize)]
struct LinkUser {
    client_user_id: String,
}

#[derive(Serialize)]
struct LinkTokenRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    client_name: &'a str,
    user: LinkUser,
    products: [&'a str; 1],
    country_codes: [&'a str; 1],
    language: &'a str,
}

#[derive(Deserialize)]
struct LinkTokenResponse {
    link_token: String,
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    public_token: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    access_token: String,
}

#[derive(Serialize)]
struct TransactionsRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    access_token: &'a str,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    transactions: Vec<ExternalTransaction>,
}

impl BankClient {
    /// Create a client for the aggregator described by `config`.
    ///
    /// # Errors
    /// Returns [Error::NetworkFailure] if the HTTP client could not be set up.
    pub fn new(config: BankConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("budget_tracker/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| Error::NetworkFailure(error.to_string()))?;

        Ok(Self { http, config })
    }

    fn credentials(&self) -> Credentials<'_> {
        Credentials {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| {
                tracing::error!("request to bank aggregator {path} failed: {error}");
                Error::NetworkFailure(error.to_string())
            })?;

        let response = check_response(response).await?;

        response.json().await.map_err(|error| {
            tracing::error!("could not read bank aggregator response from {path}: {error}");
            Error::InvalidBankData(error.to_string())
        })
    }
}

/// Turn a non-success response into [Error::BankApi] with the response body.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    tracing::error!("bank aggregator returned {status}: {message}");

    Err(Error::BankApi { status, message })
}

impl BankAggregator for BankClient {
    async fn create_link_token(&self, user_id: UserId) -> Result<String, Error> {
        let request = LinkTokenRequest {
            credentials: self.credentials(),
            client_name: "Budget Tracker",
            user: LinkUser {
                client_user_id: user_id.to_string(),
            },
            products: ["transactions"],
            country_codes: ["US"],
            language: "en",
        };

        let response: LinkTokenResponse = self.post("/link/token/create", &request).await?;

        Ok(response.link_token)
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<AccessToken, Error> {
        let request = ExchangeRequest {
            credentials: self.credentials(),
            public_token,
        };

        let response: ExchangeResponse = self.post("/item/public_token/exchange", &request).await?;

        Ok(AccessToken::new(response.access_token))
    }

    async fn fetch_transactions(
        &self,
        access_token: &AccessToken,
    ) -> Result<Vec<ExternalTransaction>, Error> {
        let today = OffsetDateTime::now_utc().date();
        let request = TransactionsRequest {
            credentials: self.credentials(),
            access_token: access_token.secret(),
            start_date: (today - IMPORT_WINDOW).to_string(),
            end_date: today.to_string(),
        };

        let response: TransactionsResponse = self.post("/transactions/get", &request).await?;

        Ok(response.transactions)
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use crate::{
        Error, UserId,
        bank_import::{AccessToken, BankAggregator, BankClient, BankConfig},
    };

    async fn link_token(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["client_id"], "client");
        assert_eq!(body["secret"], "shh");
        assert_eq!(body["user"]["client_user_id"], "7");
        Json(json!({ "link_token": "link-sandbox-1" }))
    }

    async fn exchange(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["public_token"] == "public-sandbox-1" {
            (StatusCode::OK, Json(json!({ "access_token": "access-sandbox-1" })))
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error_code": "INVALID_PUBLIC_TOKEN" })),
            )
        }
    }

    async fn transactions(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["access_token"], "access-sandbox-1");
        assert!(body["start_date"].is_string());
        Json(json!({
            "transactions": [
                { "amount": -12.5, "name": "Coffee", "category": ["Food", "Dining"], "date": "2024-01-01" },
                { "amount": 100.0, "name": "Refund", "category": null, "date": "2024-01-02" }
            ]
        }))
    }

    async fn fake_aggregator() -> String {
        let app = Router::new()
            .route("/link/token/create", post(link_token))
            .route("/item/public_token/exchange", post(exchange))
            .route("/transactions/get", post(transactions));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{address}")
    }

    fn client(base_url: String) -> BankClient {
        BankClient::new(BankConfig {
            base_url,
            client_id: "client".to_owned(),
            secret: "shh".to_owned(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn creates_link_token() {
        let client = client(fake_aggregator().await);

        let token = client.create_link_token(UserId::new(7)).await.unwrap();

        assert_eq!(token, "link-sandbox-1");
    }

    #[tokio::test]
    async fn exchanges_token_and_fetches_transactions() {
        let client = client(fake_aggregator().await);

        let access_token = client.exchange_public_token("public-sandbox-1").await.unwrap();
        let transactions = client.fetch_transactions(&access_token).await.unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].name, "Coffee");
        assert_eq!(transactions[1].category, None);
    }

    #[tokio::test]
    async fn rejected_exchange_is_an_api_error() {
        let client = client(fake_aggregator().await);

        let result = client.exchange_public_token("public-sandbox-bad").await;

        assert!(
            matches!(result, Err(Error::BankApi { status: 400, ref message }) if message.contains("INVALID_PUBLIC_TOKEN")),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_aggregator_is_a_network_failure() {
        // Bind then drop a listener so the port is very likely closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let client = client(format!("http://{address}"));

        let result = client
            .fetch_transactions(&AccessToken::new("access-sandbox-1".to_owned()))
            .await;

        assert!(matches!(result, Err(Error::NetworkFailure(_))), "got {result:?}");
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = BankConfig {
            base_url: "http://localhost".to_owned(),
            client_id: "client".to_owned(),
            secret: "shh".to_owned(),
        };

        assert!(!format!("{config:?}").contains("shh"));
    }
}
