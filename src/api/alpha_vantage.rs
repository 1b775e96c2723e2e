// ============================================================================
// API Client : Alpha Vantage
// ============================================================================
// Récupère les séries boursières depuis Alpha Vantage
//
// Deux modes de requête :
// - TIME_SERIES_INTRADAY : granularité 1min à 60min
// - TIME_SERIES_DAILY_ADJUSTED : une observation par jour, ajustée
//
// Les colonnes gardent les labels numérotés du fournisseur ("1. open",
// "2. high"...). La ColumnMap du résultat fait le lien avec Field.
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{TimeSeriesProvider, USER_AGENT};
use crate::config::{Credential, Settings};
use crate::error::FetchError;
use crate::models::{
    parse_timestamp, Cell, ColumnMap, Interval, Metadata, OutputSize, SeriesTable,
    TimeSeriesResult,
};

/// Nom du fournisseur dans les logs et les erreurs
pub const PROVIDER: &str = "Alpha Vantage";

/// Nom de l'index temporel des tables Alpha Vantage
const INDEX_NAME: &str = "date";

// ============================================================================
// Structure pour parser la réponse JSON d'Alpha Vantage
// ============================================================================
// La clé de la série dépend de la requête ("Time Series (15min)",
// "Time Series (Daily)") : elle est récupérée dans `rest` via flatten.
// En cas d'erreur, Alpha Vantage répond HTTP 200 avec un message dans
// "Error Message", "Information" ou "Note".
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Meta Data", default)]
    meta: BTreeMap<String, String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

/// Client HTTP Alpha Vantage
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    base_url: String,
    http: reqwest::Client,
}

impl AlphaVantageClient {
    /// Crée un client (timeout None : pas de limite)
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| FetchError::Client {
            provider: PROVIDER,
            source,
        })?;
        Ok(Self::with_http_client(base_url, http))
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::new(settings.alpha_vantage_url.clone(), settings.request_timeout)
    }

    /// Crée un client à partir d'un reqwest::Client déjà configuré
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Envoie une requête et parse la série renvoyée
    async fn fetch(
        &self,
        params: Vec<(&'static str, String)>,
        columns: ColumnMap,
    ) -> Result<TimeSeriesResult, FetchError> {
        debug!(url = %self.base_url, "Sending HTTP request to Alpha Vantage");
        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!(status = %status, "Alpha Vantage returned error status");
            return Err(FetchError::Status {
                provider: PROVIDER,
                status,
                body,
            });
        }

        parse_time_series(&body, columns)
    }
}

#[async_trait]
impl TimeSeriesProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, key))]
    async fn intraday(
        &self,
        key: &Credential,
        symbol: &str,
        interval: Interval,
        size: OutputSize,
    ) -> Result<TimeSeriesResult, FetchError> {
        let params = intraday_params(key, symbol, interval, size);
        let result = self
            .fetch(params, ColumnMap::alpha_vantage_intraday())
            .await?;
        info!(rows = result.len(), "Successfully fetched intraday data");
        Ok(result)
    }

    #[instrument(skip(self, key))]
    async fn daily_adjusted(
        &self,
        key: &Credential,
        symbol: &str,
        size: OutputSize,
    ) -> Result<TimeSeriesResult, FetchError> {
        let params = daily_adjusted_params(key, symbol, size);
        let result = self
            .fetch(params, ColumnMap::alpha_vantage_daily_adjusted())
            .await?;
        info!(rows = result.len(), "Successfully fetched daily adjusted data");
        Ok(result)
    }
}

/// Erreur réseau sans l'URL de la requête (sa query contient la clé API)
fn transport_error(source: reqwest::Error) -> FetchError {
    FetchError::Transport {
        provider: PROVIDER,
        source: source.without_url(),
    }
}

/// Paramètres de TIME_SERIES_INTRADAY
fn intraday_params(
    key: &Credential,
    symbol: &str,
    interval: Interval,
    size: OutputSize,
) -> Vec<(&'static str, String)> {
    vec![
        ("function", "TIME_SERIES_INTRADAY".to_string()),
        ("symbol", symbol.to_string()),
        ("interval", interval.as_str().to_string()),
        ("outputsize", size.as_str().to_string()),
        ("datatype", "json".to_string()),
        ("apikey", key.expose().to_string()),
    ]
}

/// Paramètres de TIME_SERIES_DAILY_ADJUSTED
fn daily_adjusted_params(
    key: &Credential,
    symbol: &str,
    size: OutputSize,
) -> Vec<(&'static str, String)> {
    vec![
        ("function", "TIME_SERIES_DAILY_ADJUSTED".to_string()),
        ("symbol", symbol.to_string()),
        ("outputsize", size.as_str().to_string()),
        ("datatype", "json".to_string()),
        ("apikey", key.expose().to_string()),
    ]
}

/// Parse le corps d'une réponse Alpha Vantage
///
/// CONCEPT RUST : Ownership
/// - `envelope` est consommé champ par champ (into_iter, move)
/// - Aucune copie des données de la série
fn parse_time_series(body: &str, columns: ColumnMap) -> Result<TimeSeriesResult, FetchError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        provider: PROVIDER,
        reason: e.to_string(),
    })?;

    if let Some(message) = envelope.error_message {
        warn!(message = %message, "Alpha Vantage rejected the request");
        return Err(FetchError::Rejected {
            provider: PROVIDER,
            message,
        });
    }

    let series = envelope
        .rest
        .into_iter()
        .find(|(key, _)| key.starts_with("Time Series"));

    let (series_key, series) = match series {
        Some(found) => found,
        None => {
            // Quota atteint ou fonction premium : le message est dans Information/Note
            return match envelope.information.or(envelope.note) {
                Some(message) => {
                    warn!(message = %message, "Alpha Vantage returned no data");
                    Err(FetchError::Rejected {
                        provider: PROVIDER,
                        message,
                    })
                }
                None => Err(FetchError::Decode {
                    provider: PROVIDER,
                    reason: "no time series in response".to_string(),
                }),
            };
        }
    };
    debug!(series = %series_key, "Parsing time series");

    let points: BTreeMap<String, BTreeMap<String, String>> =
        serde_json::from_value(series).map_err(|e| FetchError::Decode {
            provider: PROVIDER,
            reason: format!("{}: {}", series_key, e),
        })?;

    let mut rows = Vec::with_capacity(points.len());
    for (stamp, fields) in points {
        let timestamp = parse_timestamp(&stamp).ok_or_else(|| FetchError::Decode {
            provider: PROVIDER,
            reason: format!("invalid timestamp `{}`", stamp),
        })?;
        let cells = fields
            .into_iter()
            .map(|(label, value)| {
                let cell = Cell::from_text(&value);
                (label, cell)
            })
            .collect();
        rows.push((timestamp, cells));
    }

    let table = SeriesTable::from_time_rows(INDEX_NAME, rows);
    let metadata: Metadata = envelope.meta.into_iter().collect();
    debug!(rows = table.len(), columns = table.columns().len(), "Finished parsing time series");

    Ok(TimeSeriesResult::new(table, metadata, columns))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{http_client, serve};
    use crate::api::{pull_intraday, pull_daily};
    use crate::models::{Field, DATE_TIME_COLUMN};

    const INTRADAY_BODY: &str = r#"{
        "Meta Data": {
            "1. Information": "Intraday (15min) open, high, low, close prices and volume",
            "2. Symbol": "GOOGL",
            "3. Last Refreshed": "2024-01-02 10:15:00",
            "4. Interval": "15min",
            "5. Output Size": "Full size",
            "6. Time Zone": "US/Eastern"
        },
        "Time Series (15min)": {
            "2024-01-02 10:15:00": {"1. open": "139.90", "2. high": "140.50", "3. low": "139.80", "4. close": "140.30", "5. volume": "51000"},
            "2024-01-02 10:00:00": {"1. open": "139.60", "2. high": "140.00", "3. low": "139.40", "4. close": "139.90", "5. volume": "48000"},
            "2024-01-02 09:45:00": {"1. open": "139.10", "2. high": "139.70", "3. low": "139.00", "4. close": "139.60", "5. volume": "62000"}
        }
    }"#;

    const DAILY_BODY: &str = r#"{
        "Meta Data": {"1. Information": "Daily Time Series with Splits and Dividend Events", "2. Symbol": "BRK.B"},
        "Time Series (Daily)": {
            "2024-01-03": {"1. open": "356.0", "2. high": "358.2", "3. low": "354.1", "4. close": "357.5", "5. adjusted close": "357.5", "6. volume": "3500000", "7. dividend amount": "0.0000", "8. split coefficient": "1.0"},
            "2024-01-02": {"1. open": "354.0", "2. high": "356.9", "3. low": "353.0", "4. close": "355.8", "5. adjusted close": "355.8", "6. volume": "3100000", "7. dividend amount": "0.0000", "8. split coefficient": "1.0"}
        }
    }"#;

    #[test]
    fn test_intraday_params() {
        let params = intraday_params(
            &Credential::new("k"),
            "GOOGL",
            Interval::FifteenMin,
            OutputSize::Full,
        );
        assert!(params.contains(&("function", "TIME_SERIES_INTRADAY".to_string())));
        assert!(params.contains(&("interval", "15min".to_string())));
        assert!(params.contains(&("outputsize", "full".to_string())));
        assert!(params.contains(&("apikey", "k".to_string())));
    }

    #[test]
    fn test_daily_params() {
        let params = daily_adjusted_params(&Credential::new("k"), "BRK.B", OutputSize::Compact);
        assert!(params.contains(&("function", "TIME_SERIES_DAILY_ADJUSTED".to_string())));
        assert!(params.contains(&("symbol", "BRK.B".to_string())));
        assert!(params.contains(&("outputsize", "compact".to_string())));
    }

    #[test]
    fn test_parse_intraday() {
        let result = parse_time_series(INTRADAY_BODY, ColumnMap::alpha_vantage_intraday()).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result.metadata.get("2. Symbol"), Some("GOOGL"));
        assert_eq!(
            result.table.column_names(),
            vec!["1. open", "2. high", "3. low", "4. close", "5. volume"]
        );

        // Ordre chronologique
        let highs = result.field(Field::High).unwrap().numbers();
        assert_eq!(highs, vec![Some(139.7), Some(140.0), Some(140.5)]);
        assert_eq!(result.table.index().unwrap().name, "date");
    }

    #[test]
    fn test_parse_daily_adjusted() {
        let result =
            parse_time_series(DAILY_BODY, ColumnMap::alpha_vantage_daily_adjusted()).unwrap();
        assert_eq!(result.len(), 2);
        let adjusted = result.field(Field::AdjustedClose).unwrap().numbers();
        assert_eq!(adjusted, vec![Some(355.8), Some(357.5)]);
    }

    #[test]
    fn test_error_message_is_rejected() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        let err = parse_time_series(body, ColumnMap::new()).unwrap_err();
        assert!(matches!(err, FetchError::Rejected { provider: PROVIDER, .. }));
    }

    #[test]
    fn test_information_is_rejected() {
        let body = r#"{"Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#;
        let err = parse_time_series(body, ColumnMap::new()).unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn test_unexpected_body_is_decode_error() {
        let err = parse_time_series(r#"{"hello": "world"}"#, ColumnMap::new()).unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));

        let err = parse_time_series("<html>", ColumnMap::new()).unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn test_invalid_timestamp_is_decode_error() {
        let body = r#"{"Time Series (Daily)": {"yesterday": {"1. open": "1.0"}}}"#;
        let err = parse_time_series(body, ColumnMap::new()).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[tokio::test]
    async fn test_client_intraday_over_http() {
        let (base_url, mut requests) = serve(vec![(200, INTRADAY_BODY.to_string())]).await;
        let client =
            AlphaVantageClient::with_http_client(format!("{}/query", base_url), http_client());

        let result = pull_intraday(
            &client,
            &Credential::new("secret"),
            "GOOGL",
            Interval::FifteenMin,
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 3);
        assert!(result.table.has_column(DATE_TIME_COLUMN));

        let request = requests.recv().await.unwrap();
        assert!(request.starts_with("GET /query?"));
        assert!(request.contains("function=TIME_SERIES_INTRADAY"));
        assert!(request.contains("interval=15min"));
        assert!(request.contains("outputsize=full"));
        assert!(request.contains("apikey=secret"));
    }

    #[tokio::test]
    async fn test_client_daily_over_http() {
        let (base_url, mut requests) = serve(vec![(200, DAILY_BODY.to_string())]).await;
        let client = AlphaVantageClient::with_http_client(base_url, http_client());

        let result = pull_daily(&client, &Credential::new("secret"), "BRK.B", OutputSize::Compact)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        let request = requests.recv().await.unwrap();
        assert!(request.contains("outputsize=compact"));
        assert!(request.contains("symbol=BRK.B"));
    }

    #[tokio::test]
    async fn test_client_http_error_status() {
        let (base_url, _requests) = serve(vec![(503, "maintenance".to_string())]).await;
        let client = AlphaVantageClient::with_http_client(base_url, http_client());

        let err = client
            .daily_adjusted(&Credential::new("k"), "IBM", OutputSize::Compact)
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, body, .. } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_unreachable_is_transport_error() {
        // Port 9 (discard) : rien n'écoute en local
        let client = AlphaVantageClient::with_http_client("http://127.0.0.1:9", http_client());
        let err = client
            .intraday(
                &Credential::new("TOPSECRET123"),
                "IBM",
                Interval::OneMin,
                OutputSize::Full,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(err.to_string(), "Alpha Vantage: request failed");

        // Message complet (chaîne des causes) tel qu'écrit dans les logs
        let err = anyhow::Error::from(err);
        for rendered in [format!("{:#}", err), format!("{:?}", err)] {
            assert!(!rendered.contains("TOPSECRET123"), "key leaked: {}", rendered);
            assert!(!rendered.contains("apikey="), "query leaked: {}", rendered);
        }
    }
}
