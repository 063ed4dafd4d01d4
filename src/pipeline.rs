use std::fmt;

use tracing::{error, info};

use crate::db::{self, BankRecord};
use crate::error::EtlError;
use crate::extract::{self, TableFragment};
use crate::load;
use crate::query::{self, QueryResults};
use crate::report::{self, ChartPaths};
use crate::settings::Settings;
use crate::transform::{self, rates::ExchangeRates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Query,
    Report,
}

impl Stage {
    fn completed(self) -> &'static str {
        match self {
            Stage::Extract => "Data extraction complete",
            Stage::Transform => "Data transformation complete",
            Stage::Load => "Data load complete",
            Stage::Query => "Query stage complete",
            Stage::Report => "Report complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
            Stage::Query => "query",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Log the stage outcome; a fault ends the run.
fn finish<T>(stage: Stage, result: Result<T, EtlError>) -> anyhow::Result<T> {
    match result {
        Ok(value) => {
            info!(%stage, "{}", stage.completed());
            Ok(value)
        }
        Err(e) => {
            error!(%stage, error = %e, "Pipeline failed");
            Err(anyhow::Error::new(e).context(format!("{} stage failed", stage)))
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub records: usize,
    pub results: QueryResults,
    pub charts: ChartPaths,
}

/// Extract → Transform → Load → Query → Report, each stage's output handed
/// to the next as an argument.
pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Pipeline { settings }
    }

    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let document = match self.fetch().await {
            Ok(doc) => doc,
            Err(e) => return finish(Stage::Extract, Err(e)),
        };
        self.run_document(&document)
    }

    async fn fetch(&self) -> Result<String, EtlError> {
        let client = extract::http_client(self.settings.fetch_timeout())?;
        extract::fetch_document(&client, &self.settings.source_url).await
    }

    /// Everything after the HTTP fetch, starting from the raw page.
    pub fn run_document(&self, document: &str) -> anyhow::Result<RunSummary> {
        let fragment = finish(Stage::Extract, self.extract(document))?;
        let records = finish(Stage::Transform, self.transform(&fragment))?;
        finish(Stage::Load, load::load(&self.settings, &records))?;
        let results = finish(Stage::Query, query::run_queries(&self.settings))?;
        let charts = finish(Stage::Report, self.report(&results))?;
        Ok(RunSummary {
            records: records.len(),
            results,
            charts,
        })
    }

    /// Query and report on whatever the last run stored.
    pub fn report_existing(&self) -> anyhow::Result<RunSummary> {
        let (stored, results) = finish(Stage::Query, self.query_stored())?;
        let charts = finish(Stage::Report, self.report(&results))?;
        Ok(RunSummary {
            records: stored,
            results,
            charts,
        })
    }

    fn extract(&self, document: &str) -> Result<TableFragment, EtlError> {
        extract::find_table(document, &self.settings.table_selector)
    }

    fn transform(&self, fragment: &TableFragment) -> Result<Vec<BankRecord>, EtlError> {
        let rates = ExchangeRates::from_csv_path(&self.settings.exchange_rate_path)?;
        info!(
            currencies = rates.currency_count(),
            path = %self.settings.exchange_rate_path.display(),
            "Loaded exchange rates"
        );
        transform::transform(fragment, &rates)
    }

    fn query_stored(&self) -> Result<(usize, QueryResults), EtlError> {
        let conn = db::open_existing(&self.settings.db_path)?;
        let rows = db::read_all(&conn, &self.settings.table_name)?.len();
        drop(conn);
        info!(rows, "Read stored bank records");
        Ok((rows, query::run_queries(&self.settings)?))
    }

    fn report(&self, results: &QueryResults) -> Result<ChartPaths, EtlError> {
        report::print_results(results);
        report::render_charts(&self.settings.chart_dir, results)
    }
}

// ── Tests ──
