// Overview service - Filter, aggregate and lay out the violations overview
use crate::application::artifact_repository::ArtifactRepository;
use crate::domain::aggregate::{PeakSummary, format_count, group_sum, top_stops};
use crate::domain::chart::{ChartData, ChartKind};
use crate::domain::dashboard::{Notice, OverviewPage, Tile, Widget};
use crate::domain::filter::{FilterOptions, FilterSelection};
use crate::domain::violation::{CountTable, Dimension, TableKind};
use std::sync::Arc;
use std::time::Instant;

/// A table, or the notice explaining why it could not be loaded.
pub type Loaded<T> = Result<Arc<T>, Notice>;

/// The canonical count tables one render reads from.
#[derive(Debug, Clone)]
pub struct OverviewTables {
    pub weekday: Loaded<CountTable>,
    pub hourly: Loaded<CountTable>,
    pub monthly: Loaded<CountTable>,
    pub stop: Loaded<CountTable>,
}

fn from_table<T>(table: &Loaded<CountTable>, build: impl FnOnce(&CountTable) -> Widget<T>) -> Widget<T> {
    match table {
        Ok(table) => build(table),
        Err(notice) => Widget::Unavailable(notice.clone()),
    }
}

/// Derive every overview widget from the canonical tables for one selection.
///
/// Each widget reads only its own table, so a missing or malformed table
/// blanks the widgets that depend on it and nothing else.
pub fn render_overview(tables: &OverviewTables, selection: &FilterSelection, top_stop_limit: usize) -> OverviewPage {
    let options = match &tables.weekday {
        Ok(table) => FilterOptions::from_table(table),
        Err(_) => FilterOptions::empty(),
    };

    let summary = from_table(&tables.hourly, |table| {
        let hourly = group_sum(selection.apply(table), &[Dimension::Hour]);
        Widget::Ready(PeakSummary::from_hourly(&hourly))
    });

    let tiles = summary.clone().map(|summary| {
        vec![
            Tile::new("total_violations", "Total Violations", format_count(summary.total_violations)),
            Tile::new("peak_hour", "Peak Hour", summary.peak_hour_label()),
            Tile::new("peak_hour_count", "Violations at Peak Hour", summary.peak_count_label()),
        ]
    });

    let weekday_chart = from_table(&tables.weekday, |table| {
        let by_day = group_sum(selection.apply(table), &[Dimension::Weekday]).in_display_order();
        Widget::chart(
            ChartData::new(
                "weekday",
                "Violations by Day of the Week",
                ChartKind::Bar,
                "Day of Week",
                "Number of Violations",
            )
            .with_aggregate(&by_day),
        )
    });

    let hourly_chart = from_table(&tables.hourly, |table| {
        let by_hour = group_sum(selection.apply(table), &[Dimension::Hour]).in_display_order();
        Widget::chart(
            ChartData::new("hourly", "Hourly Violations", ChartKind::Line, "Hour of Day", "Number of Violations")
                .with_aggregate(&by_hour),
        )
    });

    let monthly_chart = from_table(&tables.monthly, |table| {
        let by_month = group_sum(selection.apply(table), &[Dimension::Month]).in_display_order();
        Widget::chart(
            ChartData::new("monthly", "Monthly Violations", ChartKind::Line, "Month", "Number of Violations")
                .with_aggregate(&by_month),
        )
    });

    let top_stops_chart = from_table(&tables.stop, |table| {
        let ranked = top_stops(selection.apply(table), top_stop_limit);
        Widget::chart(
            ChartData::new(
                "top_stops",
                &format!("Top {top_stop_limit} Stops with Most Violations"),
                ChartKind::RankedBar,
                "Bus Stop",
                "Violations",
            )
            .with_aggregate(&ranked),
        )
    });

    let heatmap = from_table(&tables.hourly, |table| {
        let cells =
            group_sum(selection.apply(table), &[Dimension::Weekday, Dimension::Hour]).in_display_order();
        Widget::chart(
            ChartData::new(
                "heatmap",
                "Heatmap of Violations (Hour × Weekday)",
                ChartKind::Heatmap,
                "Hour of Day",
                "Day of Week",
            )
            .with_aggregate(&cells),
        )
    });

    OverviewPage {
        title: "NYC Bus Violations Overview".to_string(),
        selection: selection.clone(),
        options,
        summary,
        tiles,
        weekday_chart,
        hourly_chart,
        monthly_chart,
        top_stops_chart,
        heatmap,
    }
}

#[derive(Clone)]
pub struct OverviewService {
    repository: Arc<dyn ArtifactRepository>,
    top_stop_limit: usize,
}

impl OverviewService {
    pub fn new(repository: Arc<dyn ArtifactRepository>, top_stop_limit: usize) -> Self {
        Self {
            repository,
            top_stop_limit,
        }
    }

    pub async fn load_tables(&self) -> OverviewTables {
        OverviewTables {
            weekday: self.load(TableKind::Weekday).await,
            hourly: self.load(TableKind::Hourly).await,
            monthly: self.load(TableKind::Monthly).await,
            stop: self.load(TableKind::Stop).await,
        }
    }

    async fn load(&self, kind: TableKind) -> Loaded<CountTable> {
        self.repository.count_table(kind).await.map_err(|e| {
            tracing::warn!("Count table {} unavailable: {}", kind, e);
            e.to_notice()
        })
    }

    pub async fn overview(&self, selection: &FilterSelection) -> OverviewPage {
        let tables = self.load_tables().await;
        let started = Instant::now();
        let page = render_overview(&tables, selection, self.top_stop_limit);
        tracing::debug!(
            "Rendered overview for {:?} in {:?}",
            selection,
            started.elapsed()
        );
        page
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::error::{DashboardError, Result};
    use crate::domain::artifact::Document;
    use crate::domain::chart::ChartPoint;
    use crate::domain::performance::{RoutePerformance, RouteSpeedChange};
    use crate::domain::target_list::TargetList;
    use crate::domain::violation::{CountRecord, Weekday};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::path::PathBuf;

    pub(crate) fn row(
        month: &str,
        weekday: Weekday,
        hour: Option<u8>,
        route: &str,
        stop: Option<&str>,
        violations: u64,
    ) -> CountRecord {
        CountRecord {
            month: month.to_string(),
            weekday: Some(weekday),
            hour,
            bus_route_id: route.to_string(),
            violation_type: "MOBILE BUS STOP".to_string(),
            stop_name: stop.map(str::to_string),
            violations,
        }
    }

    pub(crate) fn table(kind: TableKind, rows: Vec<CountRecord>) -> CountTable {
        CountTable::new(kind, kind.required_dimensions().to_vec(), rows)
    }

    pub(crate) fn sample_tables() -> HashMap<TableKind, Arc<CountTable>> {
        let weekday = table(
            TableKind::Weekday,
            vec![
                row("2024-01", Weekday::Friday, None, "M15", None, 30),
                row("2024-01", Weekday::Tuesday, None, "B44", None, 20),
                row("2024-02", Weekday::Tuesday, None, "M15", None, 10),
            ],
        );
        let hourly = table(
            TableKind::Hourly,
            vec![
                row("2024-01", Weekday::Friday, Some(8), "M15", None, 30),
                row("2024-01", Weekday::Tuesday, Some(7), "B44", None, 20),
                row("2024-02", Weekday::Tuesday, Some(8), "M15", None, 10),
            ],
        );
        let monthly = table(
            TableKind::Monthly,
            vec![
                row("2024-02", Weekday::Tuesday, None, "M15", None, 10),
                row("2024-01", Weekday::Friday, None, "M15", None, 30),
                row("2024-01", Weekday::Tuesday, None, "B44", None, 20),
            ],
        );
        let stop = table(
            TableKind::Stop,
            vec![
                row("2024-01", Weekday::Friday, None, "M15", Some("1 AV/E 14 ST"), 30),
                row("2024-01", Weekday::Tuesday, None, "B44", Some("NOSTRAND AV/FULTON ST"), 20),
                row("2024-02", Weekday::Tuesday, None, "M15", Some("1 AV/E 14 ST"), 10),
            ],
        );
        HashMap::from([
            (TableKind::Weekday, Arc::new(weekday)),
            (TableKind::Hourly, Arc::new(hourly)),
            (TableKind::Monthly, Arc::new(monthly)),
            (TableKind::Stop, Arc::new(stop)),
        ])
    }

    /// In-memory repository; absent tables report as missing.
    pub(crate) struct MemoryRepository {
        pub tables: HashMap<TableKind, Arc<CountTable>>,
        pub performance: Option<Arc<Vec<RoutePerformance>>>,
        pub changes: Option<Arc<Vec<RouteSpeedChange>>>,
        pub targets: Option<Arc<TargetList>>,
        pub documents: HashMap<Document, Bytes>,
    }

    impl MemoryRepository {
        pub(crate) fn with_tables(tables: HashMap<TableKind, Arc<CountTable>>) -> Self {
            Self {
                tables,
                performance: None,
                changes: None,
                targets: None,
                documents: HashMap::new(),
            }
        }
    }

    fn missing(name: &str) -> DashboardError {
        DashboardError::MissingArtifact {
            name: name.to_string(),
            path: PathBuf::from("memory").join(name),
        }
    }

    #[async_trait]
    impl ArtifactRepository for MemoryRepository {
        async fn count_table(&self, kind: TableKind) -> Result<Arc<CountTable>> {
            self.tables
                .get(&kind)
                .cloned()
                .ok_or_else(|| missing(&format!("{}.csv", kind.file_stem())))
        }

        async fn target_list(&self) -> Result<Arc<TargetList>> {
            self.targets
                .clone()
                .ok_or_else(|| missing("clear_lane_target_list.csv"))
        }

        async fn route_performance(&self) -> Result<Arc<Vec<RoutePerformance>>> {
            self.performance
                .clone()
                .ok_or_else(|| missing("before_after_ace.csv"))
        }

        async fn speed_changes(&self) -> Result<Arc<Vec<RouteSpeedChange>>> {
            self.changes.clone().ok_or_else(|| missing("top5.csv"))
        }

        async fn document(&self, document: Document) -> Result<Bytes> {
            self.documents
                .get(&document)
                .cloned()
                .ok_or_else(|| missing(document.file_name()))
        }

        async fn has_document(&self, document: Document) -> bool {
            self.documents.contains_key(&document)
        }
    }

    fn labels(chart: &Widget<ChartData>) -> Vec<String> {
        chart
            .ready()
            .map(|c| c.points.iter().map(|p: &ChartPoint| p.x.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_overview_all_filters_default() {
        let service = OverviewService::new(Arc::new(MemoryRepository::with_tables(sample_tables())), 10);
        let page = service.overview(&FilterSelection::default()).await;

        let summary = page.summary.ready().copied().unwrap();
        assert_eq!(summary.total_violations, 60);
        assert_eq!(summary.peak_hour_label(), "8");
        assert_eq!(summary.peak_count_label(), "40");

        assert_eq!(labels(&page.weekday_chart), vec!["Tuesday", "Friday"]);
        assert_eq!(labels(&page.hourly_chart), vec!["7", "8"]);
        assert_eq!(labels(&page.monthly_chart), vec!["2024-01", "2024-02"]);
        assert_eq!(labels(&page.top_stops_chart), vec!["1 AV/E 14 ST", "NOSTRAND AV/FULTON ST"]);
        assert_eq!(page.options.months, vec!["All", "2024-02", "2024-01"]);
    }

    #[tokio::test]
    async fn test_weekday_filter_applies_to_top_stops() {
        let service = OverviewService::new(Arc::new(MemoryRepository::with_tables(sample_tables())), 10);
        let selection = FilterSelection::default().with_weekday(Weekday::Tuesday);
        let page = service.overview(&selection).await;

        let top = page.top_stops_chart.ready().unwrap();
        assert_eq!(top.points[0].x, "NOSTRAND AV/FULTON ST");
        assert_eq!(top.points[0].value, 20.0);
        assert_eq!(top.points[1].value, 10.0);
    }

    #[tokio::test]
    async fn test_unknown_route_degrades_to_sentinels() {
        let service = OverviewService::new(Arc::new(MemoryRepository::with_tables(sample_tables())), 10);
        let page = service
            .overview(&FilterSelection::default().with_route("Q999"))
            .await;

        let tiles = page.tiles.ready().unwrap();
        assert_eq!(tiles[0].value, "0");
        assert_eq!(tiles[1].value, "-");
        assert_eq!(tiles[2].value, "-");
        assert_eq!(page.weekday_chart, Widget::Empty);
        assert_eq!(page.heatmap, Widget::Empty);
        assert_eq!(page.top_stops_chart, Widget::Empty);
    }

    #[tokio::test]
    async fn test_missing_table_only_blanks_its_widgets() {
        let mut tables = sample_tables();
        tables.remove(&TableKind::Stop);
        let service = OverviewService::new(Arc::new(MemoryRepository::with_tables(tables)), 10);
        let page = service.overview(&FilterSelection::default()).await;

        match &page.top_stops_chart {
            Widget::Unavailable(notice) => assert_eq!(notice.artifact, "stop_counts.csv"),
            other => panic!("expected unavailable, got {other:?}"),
        }
        assert!(page.weekday_chart.ready().is_some());
        assert!(page.tiles.ready().is_some());
    }

    #[test]
    fn test_render_is_pure() {
        let tables = sample_tables();
        let tables = OverviewTables {
            weekday: Ok(tables[&TableKind::Weekday].clone()),
            hourly: Ok(tables[&TableKind::Hourly].clone()),
            monthly: Ok(tables[&TableKind::Monthly].clone()),
            stop: Ok(tables[&TableKind::Stop].clone()),
        };
        let selection = FilterSelection::default().with_month("2024-01");
        assert_eq!(
            render_overview(&tables, &selection, 10),
            render_overview(&tables, &selection, 10)
        );
        let page = render_overview(&tables, &selection, 10);
        assert_eq!(page.summary.ready().unwrap().total_violations, 50);
    }
}
