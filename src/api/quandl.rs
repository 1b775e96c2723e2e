// ============================================================================
// API Client : Quandl (Nasdaq Data Link)
// ============================================================================
// Deux modes de requête :
// - datasets/{code} : série nommée (ex : FRED/GDP), première colonne = date
// - datatables/{code} : table filtrée (ex : WIKI/PRICES?ticker=MSFT),
//   paginée par curseur
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{EconomicDataProvider, TableQuery, USER_AGENT};
use crate::config::{Credential, Settings};
use crate::error::FetchError;
use crate::models::{
    parse_timestamp, Cell, Column, ColumnMap, Metadata, SeriesTable, TimeSeriesResult,
};

/// Nom du fournisseur dans les logs et les erreurs
pub const PROVIDER: &str = "Quandl";

/// Nombre maximum de pages suivies pour une table paginée
pub const MAX_PAGES: usize = 100;

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct DatasetEnvelope {
    dataset: Dataset,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    column_names: Vec<String>,
    data: Vec<Vec<Value>>,

    /// Tout le reste (name, description, frequency...) devient métadonnée
    #[serde(flatten)]
    info: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct DatatableEnvelope {
    datatable: Datatable,
    #[serde(default)]
    meta: DatatableMeta,
}

#[derive(Debug, Deserialize)]
struct Datatable {
    data: Vec<Vec<Value>>,
    columns: Vec<DatatableColumn>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct DatatableColumn {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct DatatableMeta {
    next_cursor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    quandl_error: QuandlError,
}

#[derive(Debug, Deserialize)]
struct QuandlError {
    code: String,
    message: String,
}

/// Client HTTP Quandl
#[derive(Debug, Clone)]
pub struct QuandlClient {
    base_url: String,
    http: reqwest::Client,
}

impl QuandlClient {
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
        Self::new(settings.quandl_url.clone(), settings.request_timeout)
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    fn endpoint(&self, kind: &str, code: &str) -> String {
        format!("{}/{}/{}.json", self.base_url.trim_end_matches('/'), kind, code)
    }

    /// GET + contrôle du status, retourne le corps brut
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError> {
        debug!(url = %url, "Sending HTTP request to Quandl");
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        let body = response.text().await.map_err(transport_error)?;

        if status.is_success() {
            return Ok(body);
        }

        // Quandl détaille ses refus dans {"quandl_error": {...}}
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                warn!(
                    status = %status,
                    code = %envelope.quandl_error.code,
                    "Quandl rejected the request"
                );
                Err(FetchError::Rejected {
                    provider: PROVIDER,
                    message: format!(
                        "{} ({})",
                        envelope.quandl_error.message, envelope.quandl_error.code
                    ),
                })
            }
            Err(_) => {
                error!(status = %status, "Quandl returned error status");
                Err(FetchError::Status {
                    provider: PROVIDER,
                    status,
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl EconomicDataProvider for QuandlClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, key))]
    async fn series(&self, key: &Credential, code: &str) -> Result<TimeSeriesResult, FetchError> {
        let url = self.endpoint("datasets", code);
        let params = vec![
            ("order".to_string(), "asc".to_string()),
            ("api_key".to_string(), key.expose().to_string()),
        ];
        let body = self.get(&url, &params).await?;
        let result = parse_dataset(&body)?;

        info!(rows = result.len(), "Successfully fetched dataset");
        Ok(result)
    }

    #[instrument(skip(self, key, query))]
    async fn table(
        &self,
        key: &Credential,
        code: &str,
        query: &TableQuery,
    ) -> Result<TimeSeriesResult, FetchError> {
        let url = self.endpoint("datatables", code);
        let mut pages = TablePages::default();
        let mut cursor: Option<String> = None;

        loop {
            let params = table_params(key, query, cursor.as_deref());
            let body = self.get(&url, &params).await?;
            let page = parse_datatable_page(&body)?;
            cursor = pages.push(page)?;

            debug!(page = pages.count, rows = pages.rows.len(), "Fetched datatable page");

            match &cursor {
                None => break,
                Some(_) if !query.paginate => break,
                Some(_) if pages.count >= MAX_PAGES => {
                    warn!(max_pages = MAX_PAGES, "Stopping pagination at page limit");
                    break;
                }
                Some(_) => {}
            }
        }

        let result = pages.into_result(code, cursor)?;
        info!(rows = result.len(), "Successfully fetched datatable");
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

/// Paramètres de requête d'une table
fn table_params(
    key: &Credential,
    query: &TableQuery,
    cursor: Option<&str>,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|(column, values)| (column.clone(), values.join(",")))
        .collect();
    if !query.columns.is_empty() {
        params.push(("qopts.columns".to_string(), query.columns.join(",")));
    }
    if let Some(cursor) = cursor {
        params.push(("qopts.cursor_id".to_string(), cursor.to_string()));
    }
    params.push(("api_key".to_string(), key.expose().to_string()));
    params
}

/// Convertit une valeur JSON scalaire en texte de métadonnée
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Cellule d'une série : nombre, texte ou vide
fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Missing,
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
        Value::String(text) => Cell::Text(text),
        other => Cell::Text(other.to_string()),
    }
}

/// Cellule d'une table typée : les colonnes "Date" deviennent des timestamps
fn typed_cell(kind: &str, value: Value) -> Cell {
    let is_date = kind.eq_ignore_ascii_case("date") || kind.eq_ignore_ascii_case("datetime");
    match value {
        Value::String(text) if is_date => match parse_timestamp(&text) {
            Some(time) => Cell::Time(time),
            None => Cell::Text(text),
        },
        other => json_cell(other),
    }
}

/// Parse une réponse datasets/{code}.json
fn parse_dataset(body: &str) -> Result<TimeSeriesResult, FetchError> {
    let envelope: DatasetEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        provider: PROVIDER,
        reason: e.to_string(),
    })?;
    let dataset = envelope.dataset;

    let (index_name, value_names) = match dataset.column_names.split_first() {
        Some((first, rest)) => (first.clone(), rest.to_vec()),
        None => {
            return Err(FetchError::Decode {
                provider: PROVIDER,
                reason: "dataset has no columns".to_string(),
            })
        }
    };

    let mut rows = Vec::with_capacity(dataset.data.len());
    for (i, row) in dataset.data.into_iter().enumerate() {
        let mut values = row.into_iter();
        let stamp = values
            .next()
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .ok_or_else(|| FetchError::Decode {
                provider: PROVIDER,
                reason: format!("row {} has no valid date", i),
            })?;
        let cells = value_names
            .iter()
            .cloned()
            .zip(values.map(json_cell))
            .collect();
        rows.push((stamp, cells));
    }

    let table = SeriesTable::from_time_rows(index_name, rows);
    let metadata: Metadata = dataset
        .info
        .iter()
        .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
        .collect();
    let columns = ColumnMap::infer(value_names.iter().map(String::as_str));

    debug!(rows = table.len(), "Finished parsing dataset");
    Ok(TimeSeriesResult::new(table, metadata, columns))
}

/// Une page de datatable décodée
#[derive(Debug)]
struct DatatablePage {
    columns: Vec<DatatableColumn>,
    rows: Vec<Vec<Cell>>,
    next_cursor: Option<String>,
}

fn parse_datatable_page(body: &str) -> Result<DatatablePage, FetchError> {
    let envelope: DatatableEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        provider: PROVIDER,
        reason: e.to_string(),
    })?;
    let columns = envelope.datatable.columns;

    let mut rows = Vec::with_capacity(envelope.datatable.data.len());
    for (i, row) in envelope.datatable.data.into_iter().enumerate() {
        if row.len() != columns.len() {
            return Err(FetchError::Decode {
                provider: PROVIDER,
                reason: format!("row {} has {} values, expected {}", i, row.len(), columns.len()),
            });
        }
        let cells = columns
            .iter()
            .zip(row)
            .map(|(column, value)| typed_cell(&column.kind, value))
            .collect();
        rows.push(cells);
    }

    Ok(DatatablePage {
        columns,
        rows,
        next_cursor: envelope.meta.next_cursor_id,
    })
}

/// Accumulateur des pages d'une table
#[derive(Debug, Default)]
struct TablePages {
    columns: Vec<DatatableColumn>,
    rows: Vec<Vec<Cell>>,
    count: usize,
}

impl TablePages {
    /// Ajoute une page, retourne le curseur suivant
    fn push(&mut self, page: DatatablePage) -> Result<Option<String>, FetchError> {
        if self.count == 0 {
            self.columns = page.columns;
        } else if self.columns != page.columns {
            return Err(FetchError::Decode {
                provider: PROVIDER,
                reason: format!("page {} has a different schema", self.count + 1),
            });
        }
        self.rows.extend(page.rows);
        self.count += 1;
        Ok(page.next_cursor)
    }

    /// Transpose les lignes en colonnes
    fn into_result(
        self,
        code: &str,
        cursor: Option<String>,
    ) -> Result<TimeSeriesResult, FetchError> {
        let mut table = SeriesTable::new(self.rows.len());
        let mut values: Vec<Vec<Cell>> = self
            .columns
            .iter()
            .map(|_| Vec::with_capacity(self.rows.len()))
            .collect();
        for row in self.rows {
            for (column, cell) in values.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        for (column, cells) in self.columns.iter().zip(values) {
            table.push_column(Column::new(column.name.clone(), cells))?;
        }

        let mut metadata = Metadata::new();
        metadata.insert("datatable_code", code);
        metadata.insert("pages", self.count.to_string());
        if let Some(cursor) = cursor {
            metadata.insert("next_cursor_id", cursor);
        }
        let columns = ColumnMap::infer(self.columns.iter().map(|c| c.name.as_str()));

        Ok(TimeSeriesResult::new(table, metadata, columns))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
