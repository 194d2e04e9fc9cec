// CSV artifact repository backed by the notebook output directories
use crate::application::artifact_repository::ArtifactRepository;
use crate::application::error::{DashboardError, Result};
use crate::domain::artifact::{ArtifactDir, Document};
use crate::domain::performance::{RoutePerformance, RouteSpeedChange};
use crate::domain::target_list::{PRIORITY_SCORE_COLUMN, TargetList};
use crate::domain::violation::{
    CountRecord, CountTable, Dimension, TableKind, VIOLATIONS_COLUMN, Weekday,
};
use crate::infrastructure::config::DataSettings;
use crate::infrastructure::table_cache::{self, MemoCache, artifact_name};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TARGET_LIST_FILE: &str = "clear_lane_target_list.csv";
const ROUTE_PERFORMANCE_FILE: &str = "before_after_ace.csv";
const SPEED_CHANGES_FILE: &str = "top5.csv";

pub struct FileArtifactRepository {
    data_dir: PathBuf,
    visualizations_dir: PathBuf,
    processed_dir: PathBuf,
    count_tables: MemoCache<CountTable>,
    target_lists: MemoCache<TargetList>,
    performance: MemoCache<Vec<RoutePerformance>>,
    speed_changes: MemoCache<Vec<RouteSpeedChange>>,
}

impl FileArtifactRepository {
    pub fn new(settings: &DataSettings) -> Self {
        Self {
            data_dir: settings.data_dir.clone(),
            visualizations_dir: settings.visualizations_dir.clone(),
            processed_dir: settings.processed_dir.clone(),
            count_tables: MemoCache::new(),
            target_lists: MemoCache::new(),
            performance: MemoCache::new(),
            speed_changes: MemoCache::new(),
        }
    }

    fn count_table_path(&self, kind: TableKind) -> PathBuf {
        self.data_dir.join(format!("{}.csv", kind.file_stem()))
    }

    fn document_path(&self, document: Document) -> PathBuf {
        let dir = match document.dir() {
            ArtifactDir::Data => &self.data_dir,
            ArtifactDir::Visualizations => &self.visualizations_dir,
        };
        dir.join(document.file_name())
    }
}

#[async_trait]
impl ArtifactRepository for FileArtifactRepository {
    async fn count_table(&self, kind: TableKind) -> Result<Arc<CountTable>> {
        let path = self.count_table_path(kind);
        self.count_tables
            .get_or_load(&path, |bytes| parse_count_table(kind, &path, bytes))
            .await
    }

    async fn target_list(&self) -> Result<Arc<TargetList>> {
        let path = self.processed_dir.join(TARGET_LIST_FILE);
        self.target_lists
            .get_or_load(&path, |bytes| parse_target_list(&path, bytes))
            .await
    }

    async fn route_performance(&self) -> Result<Arc<Vec<RoutePerformance>>> {
        let path = self.data_dir.join(ROUTE_PERFORMANCE_FILE);
        self.performance
            .get_or_load(&path, |bytes| parse_route_performance(&path, bytes))
            .await
    }

    async fn speed_changes(&self) -> Result<Arc<Vec<RouteSpeedChange>>> {
        let path = self.data_dir.join(SPEED_CHANGES_FILE);
        self.speed_changes
            .get_or_load(&path, |bytes| parse_speed_changes(&path, bytes))
            .await
    }

    async fn document(&self, document: Document) -> Result<Bytes> {
        let path = self.document_path(document);
        table_cache::read(&path).await.map(Bytes::from)
    }

    async fn has_document(&self, document: Document) -> bool {
        table_cache::stamp(&self.document_path(document)).await.is_ok()
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes)
}

fn headers(path: &Path, reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>> {
    let headers = reader
        .headers()
        .map_err(|e| DashboardError::malformed(artifact_name(path), e.to_string()))?;
    Ok(headers.iter().map(str::to_string).collect())
}

fn require_columns(path: &Path, headers: &[String], required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == column))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::malformed(
            artifact_name(path),
            format!("missing column(s) {}", missing.join(", ")),
        ))
    }
}

/// Line number (1-based, header included) of the `index`th data row.
fn line(index: usize) -> usize {
    index + 2
}

fn row_error(path: &Path, index: usize, reason: impl std::fmt::Display) -> DashboardError {
    DashboardError::malformed(artifact_name(path), format!("line {}: {}", line(index), reason))
}

#[derive(Debug, Deserialize)]
struct RawCountRow {
    month: String,
    #[serde(default)]
    weekday: Option<String>,
    #[serde(default)]
    hour: Option<String>,
    bus_route_id: String,
    violation_type: String,
    #[serde(default)]
    stop_name: Option<String>,
    violations: String,
}

/// Whole, non-negative counts; `12.0` style values from float columns are
/// accepted.
fn parse_count(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn parse_count_table(kind: TableKind, path: &Path, bytes: &[u8]) -> Result<CountTable> {
    let mut reader = reader(bytes);
    let headers = headers(path, &mut reader)?;

    let mut required: Vec<&str> = kind.required_dimensions().iter().map(|d| d.column()).collect();
    required.push(VIOLATIONS_COLUMN);
    require_columns(path, &headers, &required)?;

    let dimensions: Vec<Dimension> = [
        Dimension::Month,
        Dimension::Weekday,
        Dimension::Hour,
        Dimension::Route,
        Dimension::ViolationType,
        Dimension::Stop,
    ]
    .into_iter()
    .filter(|d| headers.iter().any(|h| h == d.column()))
    .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<RawCountRow>().enumerate() {
        let raw = result.map_err(|e| row_error(path, index, e))?;

        let weekday = non_empty(raw.weekday)
            .map(|w| w.parse::<Weekday>())
            .transpose()
            .map_err(|e| row_error(path, index, e))?;
        let hour = non_empty(raw.hour)
            .map(|h| {
                parse_count(&h)
                    .filter(|h| *h < 24)
                    .map(|h| h as u8)
                    .ok_or_else(|| row_error(path, index, format!("hour '{h}' is not in 0-23")))
            })
            .transpose()?;
        let violations = parse_count(&raw.violations).ok_or_else(|| {
            row_error(
                path,
                index,
                format!("violations '{}' is not a non-negative integer", raw.violations),
            )
        })?;

        rows.push(CountRecord {
            month: raw.month,
            weekday,
            hour,
            bus_route_id: raw.bus_route_id,
            violation_type: raw.violation_type,
            stop_name: non_empty(raw.stop_name),
            violations,
        });
    }

    let table = CountTable::new(kind, dimensions, rows);
    tracing::info!(
        "Loaded {} {} rows from {}",
        table.rows().len(),
        table.kind(),
        path.display()
    );
    Ok(table)
}

pub fn parse_target_list(path: &Path, bytes: &[u8]) -> Result<TargetList> {
    let mut reader = reader(bytes);
    let headers = headers(path, &mut reader)?;
    require_columns(path, &headers, &[PRIORITY_SCORE_COLUMN])?;
    let score_column = headers
        .iter()
        .position(|h| h == PRIORITY_SCORE_COLUMN)
        .unwrap_or_default();

    let mut cells = Vec::new();
    let mut scores = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| row_error(path, index, e))?;
        let raw_score = record.get(score_column).unwrap_or_default();
        let score = raw_score
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite())
            .ok_or_else(|| row_error(path, index, format!("score '{raw_score}' is not numeric")))?;

        scores.push(score);
        cells.push(record.iter().map(str::to_string).collect());
    }

    Ok(TargetList::new(headers, score_column, cells, scores))
}

#[derive(Debug, Deserialize)]
struct RawPerformanceRow {
    #[serde(rename = "Route ID")]
    route_id: String,
    month_dt: String,
    #[serde(rename = "is_ACE")]
    is_ace: String,
    #[serde(rename = "Average Road Speed")]
    average_road_speed: f64,
    #[serde(rename = "Average Travel Time")]
    average_travel_time: f64,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_route_performance(path: &Path, bytes: &[u8]) -> Result<Vec<RoutePerformance>> {
    let mut reader = reader(bytes);
    let headers = headers(path, &mut reader)?;
    require_columns(
        path,
        &headers,
        &["Route ID", "month_dt", "is_ACE", "Average Road Speed", "Average Travel Time"],
    )?;

    reader
        .deserialize::<RawPerformanceRow>()
        .enumerate()
        .map(|(index, result)| -> Result<RoutePerformance> {
            let raw = result.map_err(|e| row_error(path, index, e))?;
            Ok(RoutePerformance {
                month: parse_date(&raw.month_dt).ok_or_else(|| {
                    row_error(path, index, format!("month_dt '{}' is not a date", raw.month_dt))
                })?,
                is_ace: parse_flag(&raw.is_ace).ok_or_else(|| {
                    row_error(path, index, format!("is_ACE '{}' is not a boolean", raw.is_ace))
                })?,
                route_id: raw.route_id,
                average_road_speed: raw.average_road_speed,
                average_travel_time: raw.average_travel_time,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawSpeedChangeRow {
    #[serde(rename = "Route ID")]
    route_id: String,
    #[serde(rename = "False")]
    without_ace: f64,
    #[serde(rename = "True")]
    with_ace: f64,
    #[serde(rename = "Pct Change")]
    pct_change: f64,
}

pub fn parse_speed_changes(path: &Path, bytes: &[u8]) -> Result<Vec<RouteSpeedChange>> {
    let mut reader = reader(bytes);
    let headers = headers(path, &mut reader)?;
    require_columns(path, &headers, &["Route ID", "False", "True", "Pct Change"])?;

    reader
        .deserialize::<RawSpeedChangeRow>()
        .enumerate()
        .map(|(index, result)| -> Result<RouteSpeedChange> {
            let raw = result.map_err(|e| row_error(path, index, e))?;
            Ok(RouteSpeedChange {
                route_id: raw.route_id,
                without_ace: raw.without_ace,
                with_ace: raw.with_ace,
                pct_change: raw.pct_change,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const WEEKDAY_CSV: &str = "\
month,weekday,bus_route_id,violation_type,violations
2024-01,Monday,M15,MOBILE BUS STOP,12
2024-01,Tuesday,B44,BUS LANE,7.0
";

    fn settings(root: &Path) -> DataSettings {
        DataSettings {
            data_dir: root.join("data"),
            visualizations_dir: root.join("visualizations"),
            processed_dir: root.join("data/processed"),
        }
    }

    fn repo_with(files: &[(&str, &str)]) -> (tempfile::TempDir, FileArtifactRepository) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let repo = FileArtifactRepository::new(&settings(dir.path()));
        (dir, repo)
    }

    #[tokio::test]
    async fn test_loads_weekday_table() {
        let (_dir, repo) = repo_with(&[("data/weekday_counts.csv", WEEKDAY_CSV)]);
        let table = repo.count_table(TableKind::Weekday).await.unwrap();

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].weekday, Some(Weekday::Monday));
        assert_eq!(table.rows()[1].violations, 7);
        assert!(table.has_dimension(Dimension::Weekday));
        assert!(!table.has_dimension(Dimension::Hour));
    }

    #[tokio::test]
    async fn test_missing_table_is_missing_artifact() {
        let (_dir, repo) = repo_with(&[]);
        let err = repo.count_table(TableKind::Stop).await.unwrap_err();
        assert!(matches!(err, DashboardError::MissingArtifact { ref name, .. } if name == "stop_counts.csv"));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let csv = "month,weekday,bus_route_id,violations\n2024-01,Monday,M15,3\n";
        let err = parse_count_table(TableKind::Weekday, Path::new("weekday_counts.csv"), csv.as_bytes())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed artifact 'weekday_counts.csv': missing column(s) violation_type"
        );
    }

    #[test]
    fn test_non_numeric_count_is_malformed_with_line() {
        let csv = "month,weekday,hour,bus_route_id,violation_type,violations\n\
                   2024-01,Monday,8,M15,BUS LANE,3\n\
                   2024-01,Monday,9,M15,BUS LANE,lots\n";
        let err = parse_count_table(TableKind::Hourly, Path::new("hourly_counts.csv"), csv.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_hour_out_of_range_is_malformed() {
        let csv = "month,weekday,hour,bus_route_id,violation_type,violations\n\
                   2024-01,Monday,24,M15,BUS LANE,3\n";
        assert!(parse_count_table(TableKind::Hourly, Path::new("hourly_counts.csv"), csv.as_bytes()).is_err());
    }

    #[test]
    fn test_monthly_table_without_weekday_column() {
        let csv = "month,bus_route_id,violation_type,violations\n2024-03,M15,BUS LANE,9\n";
        let table =
            parse_count_table(TableKind::Monthly, Path::new("monthly_counts.csv"), csv.as_bytes()).unwrap();
        assert!(!table.has_dimension(Dimension::Weekday));
        assert_eq!(table.rows()[0].weekday, None);
    }

    #[tokio::test]
    async fn test_target_list() {
        let csv = "stop_name,violations,ClearLane Priority Score\nW 125 ST,900,0.95\nFULTON ST,300,0.2\n";
        let (_dir, repo) = repo_with(&[("data/processed/clear_lane_target_list.csv", csv)]);
        let targets = repo.target_list().await.unwrap();

        assert_eq!(targets.columns.len(), 3);
        assert_eq!(targets.score_column, 2);
        assert_eq!(targets.rows[0].cells[0], "W 125 ST");
        assert_eq!(targets.rows[0].background, "#67000d");
    }

    #[test]
    fn test_target_list_requires_numeric_score() {
        let csv = "stop_name,ClearLane Priority Score\nW 125 ST,high\n";
        let err = parse_target_list(Path::new(TARGET_LIST_FILE), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::MalformedInput { .. }));
    }

    #[test]
    fn test_route_performance() {
        let csv = "Route ID,month_dt,is_ACE,Average Road Speed,Average Travel Time\n\
                   M15,2024-01-01,False,7.1,48.5\n\
                   M15,2024-02-01 00:00:00,True,7.9,44.0\n";
        let rows = parse_route_performance(Path::new(ROUTE_PERFORMANCE_FILE), csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].is_ace && rows[1].is_ace);
        assert_eq!(rows[1].month, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_speed_changes() {
        let csv = "Route ID,False,True,Pct Change\nBx12,8.0,8.8,10.0\n";
        let rows = parse_speed_changes(Path::new(SPEED_CHANGES_FILE), csv.as_bytes()).unwrap();
        assert_eq!(rows[0].route_id, "Bx12");
        assert_eq!(rows[0].pct_change, 10.0);
    }

    #[tokio::test]
    async fn test_documents() {
        let (_dir, repo) = repo_with(&[("visualizations/exempt_hotspots_map.html", "<html>map</html>")]);
        assert!(repo.has_document(Document::HotspotsMap).await);
        assert!(!repo.has_document(Document::RouteMap3d).await);
        assert_eq!(
            repo.document(Document::HotspotsMap).await.unwrap(),
            Bytes::from_static(b"<html>map</html>")
        );
        assert!(matches!(
            repo.document(Document::BusMap).await,
            Err(DashboardError::MissingArtifact { .. })
        ));
    }
}
