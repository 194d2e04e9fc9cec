// Performance service - Bus speed and travel time before and after ACE
use crate::application::artifact_repository::ArtifactRepository;
use crate::domain::chart::{ChartData, ChartKind, ChartPoint};
use crate::domain::dashboard::{PerformancePage, Tile, Widget};
use crate::domain::performance::{
    AceComparison, PerformanceMetric, RouteSpeedChange, compare_route, route_ids, top_and_bottom,
};
use std::sync::Arc;

const HIGHLIGHTED_ROUTES: usize = 5;

#[derive(Clone)]
pub struct PerformanceService {
    repository: Arc<dyn ArtifactRepository>,
}

impl PerformanceService {
    pub fn new(repository: Arc<dyn ArtifactRepository>) -> Self {
        Self { repository }
    }

    /// Build the ACE page for `route` (first route when not given).
    pub async fn performance(&self, route: Option<&str>, metric: PerformanceMetric) -> PerformancePage {
        let (routes, comparison) = match self.repository.route_performance().await {
            Ok(rows) => {
                let routes = route_ids(&rows);
                let selected = route
                    .map(str::to_string)
                    .or_else(|| routes.first().cloned());
                let comparison = match selected {
                    Some(route) => {
                        let cmp = compare_route(&rows, &route, metric);
                        if cmp.series.is_empty() {
                            Widget::Empty
                        } else {
                            Widget::Ready(cmp)
                        }
                    }
                    None => Widget::Empty,
                };
                (routes, comparison)
            }
            Err(e) => {
                tracing::warn!("Route performance unavailable: {}", e);
                (Vec::new(), Widget::Unavailable(e.to_notice()))
            }
        };

        let top_bottom_chart = match self.repository.speed_changes().await {
            Ok(changes) => Widget::chart(speed_change_chart(&changes)),
            Err(e) => {
                tracing::warn!("Route speed changes unavailable: {}", e);
                Widget::Unavailable(e.to_notice())
            }
        };

        PerformancePage {
            title: "ACE System & Bus Performance".to_string(),
            routes,
            metric,
            tiles: comparison.clone().map(|cmp| comparison_tiles(&cmp)),
            trend_chart: comparison.clone().map(|cmp| trend_chart(&cmp)),
            comparison,
            top_bottom_chart,
        }
    }
}

fn comparison_tiles(cmp: &AceComparison) -> Vec<Tile> {
    let unit = cmp.metric.unit();
    vec![
        Tile::new(
            "average",
            &format!("Average {}", cmp.metric.title()),
            format!("{:.2} {}", cmp.average.unwrap_or(0.0), unit),
        ),
        Tile::new(
            "change_after_ace",
            "Change After ACE",
            cmp.percent_change
                .map_or_else(|| "N/A".to_string(), |pct| format!("{pct:.2}%")),
        ),
    ]
}

fn trend_chart(cmp: &AceComparison) -> ChartData {
    let points = cmp
        .series
        .iter()
        .map(|row| ChartPoint {
            x: row.month.format("%Y-%m-%d").to_string(),
            y: Some(if row.is_ace { "true" } else { "false" }.to_string()),
            value: cmp.metric.of(row),
        })
        .collect();

    ChartData::new(
        "before_after_ace",
        &format!("{} Before vs After ACE", cmp.metric.title()),
        ChartKind::Line,
        "Month",
        cmp.metric.title(),
    )
    .with_points(points)
    .with_y_domain(cmp.y_domain)
}

fn speed_change_chart(changes: &[RouteSpeedChange]) -> ChartData {
    let points = top_and_bottom(changes, HIGHLIGHTED_ROUTES)
        .into_iter()
        .map(|c| ChartPoint::new(c.route_id, c.pct_change))
        .collect();

    ChartData::new(
        "top_bottom_routes",
        "Top/Bottom Routes by % Change in Average Speed After ACE",
        ChartKind::Diverging,
        "Route ID",
        "% Change in Average Speed",
    )
    .with_points(points)
}
