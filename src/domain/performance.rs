// Bus performance before and after automated camera enforcement (ACE)
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One route-month observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePerformance {
    pub route_id: String,
    pub month: NaiveDate,
    pub is_ace: bool,
    pub average_road_speed: f64,
    pub average_travel_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMetric {
    #[default]
    RoadSpeed,
    TravelTime,
}

impl PerformanceMetric {
    pub const ALL: [PerformanceMetric; 2] = [PerformanceMetric::RoadSpeed, PerformanceMetric::TravelTime];

    pub fn title(self) -> &'static str {
        match self {
            PerformanceMetric::RoadSpeed => "Average Road Speed",
            PerformanceMetric::TravelTime => "Average Travel Time",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            PerformanceMetric::RoadSpeed => "mph",
            PerformanceMetric::TravelTime => "min",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            PerformanceMetric::RoadSpeed => "road_speed",
            PerformanceMetric::TravelTime => "travel_time",
        }
    }

    pub fn of(self, row: &RoutePerformance) -> f64 {
        match self {
            PerformanceMetric::RoadSpeed => row.average_road_speed,
            PerformanceMetric::TravelTime => row.average_travel_time,
        }
    }
}

impl fmt::Display for PerformanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for PerformanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PerformanceMetric::ALL
            .into_iter()
            .find(|m| m.slug() == s || m.title() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

/// Metric summary for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AceComparison {
    pub route_id: String,
    pub metric: PerformanceMetric,
    pub average: Option<f64>,
    pub before_ace: Option<f64>,
    pub after_ace: Option<f64>,
    pub percent_change: Option<f64>,
    /// Observations sorted by month.
    pub series: Vec<RoutePerformance>,
    /// Value axis bounds padded by a tenth of the value range.
    pub y_domain: Option<(f64, f64)>,
}

/// Routes available for selection, ascending.
pub fn route_ids(rows: &[RoutePerformance]) -> Vec<String> {
    let mut routes: Vec<String> = rows.iter().map(|r| r.route_id.clone()).collect();
    routes.sort();
    routes.dedup();
    routes
}

pub fn compare_route(rows: &[RoutePerformance], route_id: &str, metric: PerformanceMetric) -> AceComparison {
    let mut series: Vec<RoutePerformance> = rows
        .iter()
        .filter(|r| r.route_id == route_id)
        .cloned()
        .collect();
    series.sort_by_key(|r| r.month);

    let observed = &series;
    let values = move |ace: Option<bool>| {
        observed
            .iter()
            .filter(move |r| ace.is_none_or(|flag| r.is_ace == flag))
            .map(move |r| metric.of(r))
    };

    let average = mean(values(None));
    let before_ace = mean(values(Some(false)));
    let after_ace = mean(values(Some(true)));
    let percent_change = match (before_ace, after_ace) {
        (Some(before), Some(after)) if before != 0.0 => Some((after - before) / before * 100.0),
        _ => None,
    };

    let y_domain = values(None).fold(None, |acc: Option<(f64, f64)>, v| match acc {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    });
    let y_domain = y_domain.map(|(lo, hi)| {
        let margin = (hi - lo) * 0.1;
        (lo - margin, hi + margin)
    });

    AceComparison {
        route_id: route_id.to_string(),
        metric,
        average,
        before_ace,
        after_ace,
        percent_change,
        series,
        y_domain,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Average speed per route without and with enforcement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSpeedChange {
    pub route_id: String,
    pub without_ace: f64,
    pub with_ace: f64,
    pub pct_change: f64,
}

/// The `n` largest drops and `n` largest gains, most negative first.
pub fn top_and_bottom(changes: &[RouteSpeedChange], n: usize) -> Vec<RouteSpeedChange> {
    let mut sorted = changes.to_vec();
    sorted.sort_by(|a, b| a.pct_change.total_cmp(&b.pct_change));

    if sorted.len() <= n * 2 {
        return sorted;
    }
    let tail = sorted.split_off(sorted.len() - n);
    sorted.truncate(n);
    sorted.extend(tail);
    sorted
}
