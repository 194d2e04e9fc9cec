// Chart data domain models
use super::aggregate::Aggregate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    /// Second category for heatmaps.
    pub y: Option<String>,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(x: String, value: f64) -> Self {
        Self { x, y: None, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Vertical bars with count labels.
    Bar,
    /// Horizontal bars sorted by value.
    RankedBar,
    Line,
    Heatmap,
    /// Vertical bars colored by sign.
    Diverging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_title: String,
    pub y_title: String,
    pub y_domain: Option<(f64, f64)>,
    pub points: Vec<ChartPoint>,
}

impl ChartData {
    pub fn new(id: &str, title: &str, kind: ChartKind, x_title: &str, y_title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            x_title: x_title.to_string(),
            y_title: y_title.to_string(),
            y_domain: None,
            points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<ChartPoint>) -> Self {
        self.points = points;
        self
    }

    pub fn with_y_domain(mut self, domain: Option<(f64, f64)>) -> Self {
        self.y_domain = domain;
        self
    }

    /// One point per group; a second key component becomes `y`.
    pub fn with_aggregate(self, aggregate: &Aggregate) -> Self {
        let points = aggregate
            .groups
            .iter()
            .map(|g| ChartPoint {
                x: g.key.first().map(|k| k.label()).unwrap_or_default(),
                y: g.key.get(1).map(|k| k.label()),
                value: g.violations as f64,
            })
            .collect();
        self.with_points(points)
    }
}
