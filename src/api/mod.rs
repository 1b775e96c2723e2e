// ============================================================================
// Module : api
// ============================================================================
// Clients des fournisseurs de données et fonctions de récupération
//
// - TimeSeriesProvider : actions (intraday, daily adjusted), ex. Alpha Vantage
// - EconomicDataProvider : séries macro et tables, ex. Quandl
// - pull_* : fonctions appelées par le binaire, un appel réseau chacune
//
// CONCEPT RUST : Traits aux frontières
// - Les fetchers sont génériques sur le fournisseur
// - Les tests utilisent des fournisseurs factices, sans réseau
// ============================================================================

pub mod alpha_vantage; // Client API Alpha Vantage
pub mod quandl;        // Client API Quandl (Nasdaq Data Link)

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::config::Credential;
use crate::error::FetchError;
use crate::models::{Interval, OutputSize, TimeSeriesResult, DATE_TIME_COLUMN};

// Re-export des clients
pub use alpha_vantage::AlphaVantageClient;
pub use quandl::QuandlClient;

/// User-Agent envoyé avec chaque requête
pub(crate) const USER_AGENT: &str = concat!("finseries/", env!("CARGO_PKG_VERSION"));

/// Fournisseur de séries boursières (fournisseur A)
#[async_trait]
pub trait TimeSeriesProvider: Send + Sync {
    /// Nom affiché dans les logs et les erreurs
    fn name(&self) -> &'static str;

    /// Série intraday à la granularité demandée
    async fn intraday(
        &self,
        key: &Credential,
        symbol: &str,
        interval: Interval,
        size: OutputSize,
    ) -> Result<TimeSeriesResult, FetchError>;

    /// Série quotidienne ajustée (splits, dividendes)
    async fn daily_adjusted(
        &self,
        key: &Credential,
        symbol: &str,
        size: OutputSize,
    ) -> Result<TimeSeriesResult, FetchError>;
}

/// Fournisseur de données économiques et tabulaires (fournisseur B)
#[async_trait]
pub trait EconomicDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Série nommée (ex : "FRED/GDP"), indexée par date
    async fn series(&self, key: &Credential, code: &str) -> Result<TimeSeriesResult, FetchError>;

    /// Table filtrée (ex : "WIKI/PRICES" avec ticker = MSFT)
    async fn table(
        &self,
        key: &Credential,
        code: &str,
        query: &TableQuery,
    ) -> Result<TimeSeriesResult, FetchError>;
}

/// Filtres d'une requête de table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    /// (colonne, valeurs acceptées)
    pub filters: Vec<(String, Vec<String>)>,

    /// Colonnes à retourner (vide : toutes)
    pub columns: Vec<String>,

    /// Suivre les curseurs de pagination jusqu'à la dernière page
    pub paginate: bool,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute un filtre sur une colonne (une ou plusieurs valeurs)
    pub fn filter<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters
            .push((column.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }
}

// ============================================================================
// Fonctions de récupération
// ============================================================================
// Chaque fonction transmet ses sélecteurs sans les modifier, puis copie
// l'index temporel dans la colonne "date_time" (axe X du graphique).
// Les erreurs du fournisseur remontent telles quelles, sans retry.
// ============================================================================

/// Récupère la série intraday la plus longue disponible pour un symbole
///
/// # Exemple
/// let result = pull_intraday(&client, &key, "GOOGL", Interval::FifteenMin).await?;
#[instrument(skip(provider, key), fields(provider = provider.name()))]
pub async fn pull_intraday<P>(
    provider: &P,
    key: &Credential,
    symbol: &str,
    interval: Interval,
) -> Result<TimeSeriesResult, FetchError>
where
    P: TimeSeriesProvider + ?Sized,
{
    let mut result = provider
        .intraday(key, symbol, interval, OutputSize::Full)
        .await?;
    result.table.promote_index(DATE_TIME_COLUMN)?;

    info!(rows = result.len(), "Intraday series fetched");
    Ok(result)
}

/// Récupère la série quotidienne ajustée d'un symbole
#[instrument(skip(provider, key), fields(provider = provider.name()))]
pub async fn pull_daily<P>(
    provider: &P,
    key: &Credential,
    symbol: &str,
    size: OutputSize,
) -> Result<TimeSeriesResult, FetchError>
where
    P: TimeSeriesProvider + ?Sized,
{
    let mut result = provider.daily_adjusted(key, symbol, size).await?;
    result.table.promote_index(DATE_TIME_COLUMN)?;

    info!(rows = result.len(), "Daily series fetched");
    Ok(result)
}

/// Récupère une série économique nommée
#[instrument(skip(provider, key), fields(provider = provider.name()))]
pub async fn pull_series<P>(
    provider: &P,
    key: &Credential,
    code: &str,
) -> Result<TimeSeriesResult, FetchError>
where
    P: EconomicDataProvider + ?Sized,
{
    let mut result = provider.series(key, code).await?;
    result.table.promote_index(DATE_TIME_COLUMN)?;

    info!(rows = result.len(), "Economic series fetched");
    Ok(result)
}

/// Récupère une table filtrée
///
/// Pas de colonne "date_time" ici : la table n'a pas d'index temporel,
/// elle porte sa propre colonne de dates (ex : "date").
#[instrument(
    skip(provider, key, query),
    fields(provider = provider.name(), filters = query.filters.len())
)]
pub async fn pull_table<P>(
    provider: &P,
    key: &Credential,
    code: &str,
    query: &TableQuery,
) -> Result<TimeSeriesResult, FetchError>
where
    P: EconomicDataProvider + ?Sized,
{
    let result = provider.table(key, code, query).await?;

    info!(rows = result.len(), "Table fetched");
    Ok(result)
}

// ============================================================================
// Outils de test : serveur HTTP local à réponses fixes
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Client HTTP de test (sans proxy système)
    pub fn http_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// Sert les réponses (status, body) dans l'ordre, une par connexion
    ///
    /// Retourne l'URL de base et un canal qui reçoit la ligne de requête
    /// ("GET /path?query HTTP/1.1") de chaque appel.
    pub async fn serve(responses: Vec<(u16, String)>) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 16 * 1024];
                let n = socket.read(&mut buf).await.unwrap();
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let _ = tx.send(request.lines().next().unwrap_or_default().to_string());

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), rx)
    }
}

// ============================================================================
// Tests unitaires : contrat des fetchers avec des fournisseurs factices
// ============================================================================
