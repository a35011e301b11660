//! Appearance data loading from the show database.
//!
//! This module opens a single MySQL connection, runs the read-only
//! appearance and show-year queries, and closes the connection again.

use crate::config::DatabaseConfig;
use crate::error::ReportError;
use crate::models::{AppearanceRecord, Dataset};
use chrono::NaiveDate;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which shows count towards the appearance totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowFilter {
    /// Keep "best of" compilation shows.
    pub include_best_of: bool,
    /// Keep repeat broadcasts.
    pub include_repeats: bool,
}

impl From<&crate::config::ReportConfig> for ShowFilter {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_best_of: config.include_best_of,
            include_repeats: config.include_repeats,
        }
    }
}

const SHOW_YEARS_QUERY: &str = "SELECT DISTINCT CAST(YEAR(s.showdate) AS SIGNED) AS show_year \
     FROM ww_shows s \
     WHERE s.showdate IS NOT NULL \
     ORDER BY show_year ASC";

/// Build the appearance query for the given filter.
///
/// One row is returned per (panelist, show) pair.
pub fn appearance_query(filter: ShowFilter) -> String {
    let mut query = String::from(
        "SELECT CAST(p.panelistid AS SIGNED) AS panelist_id, \
         p.panelist AS panelist, \
         s.showdate AS show_date \
         FROM ww_showpnlmap pm \
         JOIN ww_shows s ON s.showid = pm.showid \
         JOIN ww_panelists p ON p.panelistid = pm.panelistid",
    );

    let mut conditions = Vec::new();
    if !filter.include_best_of {
        conditions.push("s.bestof = 0");
    }
    if !filter.include_repeats {
        conditions.push("s.repeatshowid IS NULL");
    }
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }

    query.push_str(" ORDER BY p.panelist ASC, s.showdate ASC");
    query
}

/// Raw row shape of the appearance query.
#[derive(Debug, sqlx::FromRow)]
struct AppearanceRow {
    panelist_id: i64,
    panelist: String,
    show_date: NaiveDate,
}

impl From<AppearanceRow> for AppearanceRecord {
    fn from(row: AppearanceRow) -> Self {
        AppearanceRecord::new(row.panelist_id, row.panelist, row.show_date)
    }
}

/// Build driver connection options from configuration.
pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);

    if config.password.is_empty() {
        options
    } else {
        options.password(&config.password)
    }
}

/// An open, read-only session against the show database.
pub struct AppearanceLoader {
    conn: MySqlConnection,
}

impl AppearanceLoader {
    /// Open a connection, failing with [`ReportError::Connection`] if the
    /// server cannot be reached within the configured timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ReportError> {
        let label = config.source_label();
        let timeout = Duration::from_secs(config.connect_timeout_seconds.max(1));
        info!("Connecting to {}", label);

        let options = connect_options(config);
        let conn = match tokio::time::timeout(timeout, options.connect()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(ReportError::Connection(format!("{}: {}", label, e))),
            Err(_) => {
                return Err(ReportError::Connection(format!(
                    "{}: timed out after {}s",
                    label,
                    timeout.as_secs()
                )))
            }
        };

        debug!("Connected to {}", label);
        Ok(Self { conn })
    }

    /// Fetch every appearance matching the filter.
    pub async fn load_appearances(
        &mut self,
        filter: ShowFilter,
    ) -> Result<Vec<AppearanceRecord>, ReportError> {
        let query = appearance_query(filter);
        debug!("Appearance query: {}", query);

        let rows = sqlx::query_as::<_, AppearanceRow>(&query)
            .fetch_all(&mut self.conn)
            .await
            .map_err(ReportError::from_query)?;

        Ok(rows.into_iter().map(AppearanceRecord::from).collect())
    }

    /// Fetch the distinct years in which shows aired, ascending.
    pub async fn load_show_years(&mut self) -> Result<Vec<i32>, ReportError> {
        let years = sqlx::query_scalar::<_, i64>(SHOW_YEARS_QUERY)
            .fetch_all(&mut self.conn)
            .await
            .map_err(ReportError::from_query)?;

        years
            .into_iter()
            .map(|year| {
                i32::try_from(year)
                    .map_err(|_| ReportError::Query(format!("Show year out of range: {}", year)))
            })
            .collect()
    }

    /// Close the connection.
    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            // The data is already in memory; a dirty close doesn't affect the report.
            warn!("Error while closing database connection: {}", e);
        }
    }
}

/// Load everything needed for one report run over a single connection.
///
/// The connection is closed before this returns.
pub async fn load_dataset(
    config: &DatabaseConfig,
    filter: ShowFilter,
) -> Result<Dataset, ReportError> {
    let started = Instant::now();
    let mut loader = AppearanceLoader::connect(config).await?;

    let result = async {
        let records = loader.load_appearances(filter).await?;
        let show_years = loader.load_show_years().await?;
        Ok::<_, ReportError>(Dataset {
            records,
            show_years,
        })
    }
    .await;

    loader.close().await;

    let dataset = result?;
    info!(
        "Loaded {} appearances across {} show years in {:.2}s",
        dataset.records.len(),
        dataset.show_years.len(),
        started.elapsed().as_secs_f64()
    );

    Ok(dataset)
}
