// ============================================================================
// finseries - Parcours des quatre jeux de données
// ============================================================================
// Récupère puis trace, dans l'ordre :
// 1. GOOGL intraday 15 minutes (Alpha Vantage)
// 2. BRK.B quotidien ajusté (Alpha Vantage)
// 3. PIB trimestriel FRED/GDP (Quandl)
// 4. Prix quotidiens de MSFT, table WIKI/PRICES (Quandl)
//
// CONCEPTS RUST CLÉS :
// 1. Async dans sync : tokio::runtime::Runtime pour les appels API
// 2. Trait objects : Box<dyn Presenter> choisi au démarrage
// 3. Propagation d'erreurs avec ? : arrêt à la première erreur
// ============================================================================

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use finseries::api::{
    pull_daily, pull_intraday, pull_series, pull_table, AlphaVantageClient, QuandlClient,
    TableQuery,
};
use finseries::config::Settings;
use finseries::models::{Field, Interval, OutputSize, DATE_TIME_COLUMN};
use finseries::ui::{plot_data, Presenter, TerminalPresenter, TextExporter};

/// Initialise le système de logging
///
/// Les logs vont dans un fichier (le terminal est occupé par les graphiques).
/// Rotation quotidienne : finseries.log.2024-01-15
fn init_logging(settings: &Settings) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = settings.log_dir.clone();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "finseries.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // RUST_LOG=finseries=trace pour plus de détails
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finseries=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

/// Sortie choisie selon la configuration
///
/// FINSERIES_EXPORT_DIR défini : fichiers texte, sinon terminal interactif
fn make_presenter(settings: &Settings) -> Result<Box<dyn Presenter>> {
    match &settings.export_dir {
        Some(dir) => {
            info!(?dir, "Exporting charts as text");
            Ok(Box::new(TextExporter::new(dir)?))
        }
        None => Ok(Box::new(TerminalPresenter::new())),
    }
}

fn run(settings: &Settings, presenter: &mut dyn Presenter, runtime: &Runtime) -> Result<()> {
    let alpha_vantage = AlphaVantageClient::from_settings(settings)?;
    let quandl = QuandlClient::from_settings(settings)?;

    // 1. Intraday Google
    println!("📊 GOOGL intraday (15min)...");
    let google = runtime.block_on(pull_intraday(
        &alpha_vantage,
        &settings.alpha_vantage_key,
        "GOOGL",
        Interval::FifteenMin,
    ))?;
    plot_data(
        presenter,
        &google.table,
        DATE_TIME_COLUMN,
        google.label(Field::High)?,
        "High Values, Google Stock, 15 Minute Data",
    )?;

    // 2. Quotidien Berkshire Hathaway
    println!("📊 BRK.B daily...");
    let berkshire = runtime.block_on(pull_daily(
        &alpha_vantage,
        &settings.alpha_vantage_key,
        "BRK.B",
        OutputSize::Compact,
    ))?;
    plot_data(
        presenter,
        &berkshire.table,
        DATE_TIME_COLUMN,
        berkshire.label(Field::High)?,
        "High Values, Berkshire Hathaway Stock, Daily Data",
    )?;

    // 3. PIB trimestriel
    println!("📊 FRED/GDP...");
    let gdp = runtime.block_on(pull_series(&quandl, &settings.quandl_key, "FRED/GDP"))?;
    plot_data(
        presenter,
        &gdp.table,
        DATE_TIME_COLUMN,
        gdp.label(Field::Value)?,
        "Quarterly GDP Data",
    )?;

    // 4. Table des prix, filtrée sur Microsoft
    println!("📊 WIKI/PRICES (MSFT)...");
    let query = TableQuery::new().filter("ticker", ["MSFT"]);
    let microsoft = runtime.block_on(pull_table(
        &quandl,
        &settings.quandl_key,
        "WIKI/PRICES",
        &query,
    ))?;
    plot_data(
        presenter,
        &microsoft.table,
        "date",
        microsoft.label(Field::Open)?,
        "Daily Microsoft Stock Prices, Opening Price",
    )?;

    Ok(())
}

fn main() -> Result<()> {
    let settings = Settings::from_env().context("Configuration invalide")?;

    init_logging(&settings).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("finseries starting up");
    if settings.alpha_vantage_key.is_demo() {
        warn!("ALPHA_VANTAGE_API_KEY not set, using the demo key");
    }
    if settings.quandl_key.is_demo() {
        warn!("QUANDL_API_KEY not set, using the demo key");
    }

    let runtime = Runtime::new()?;
    let mut presenter = make_presenter(&settings)?;

    if let Err(e) = run(&settings, presenter.as_mut(), &runtime) {
        error!("Walkthrough failed: {:#}", e);
        return Err(e);
    }

    info!("finseries finished");
    println!("✅ Terminé");
    Ok(())
}
