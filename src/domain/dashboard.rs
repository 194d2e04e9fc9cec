// Dashboard view models
use super::aggregate::PeakSummary;
use super::artifact::Document;
use super::chart::ChartData;
use super::filter::{FilterOptions, FilterSelection};
use super::performance::{AceComparison, PerformanceMetric};
use super::target_list::TargetList;
use serde::Serialize;

/// Why a widget could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub artifact: String,
    pub message: String,
}

/// A single independently rendered piece of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Widget<T> {
    Ready(T),
    /// Nothing matched the current selection.
    Empty,
    Unavailable(Notice),
}

impl<T> Widget<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Widget<U> {
        match self {
            Widget::Ready(value) => Widget::Ready(f(value)),
            Widget::Empty => Widget::Empty,
            Widget::Unavailable(notice) => Widget::Unavailable(notice),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Widget::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl Widget<ChartData> {
    /// Charts with no points degrade to [`Widget::Empty`].
    pub fn chart(chart: ChartData) -> Self {
        if chart.points.is_empty() {
            Widget::Empty
        } else {
            Widget::Ready(chart)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub id: String,
    pub title: String,
    pub value: String,
}

impl Tile {
    pub fn new(id: &str, title: &str, value: String) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewPage {
    pub title: String,
    pub selection: FilterSelection,
    pub options: FilterOptions,
    pub summary: Widget<PeakSummary>,
    pub tiles: Widget<Vec<Tile>>,
    pub weekday_chart: Widget<ChartData>,
    pub hourly_chart: Widget<ChartData>,
    pub monthly_chart: Widget<ChartData>,
    pub top_stops_chart: Widget<ChartData>,
    pub heatmap: Widget<ChartData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformancePage {
    pub title: String,
    pub routes: Vec<String>,
    pub metric: PerformanceMetric,
    pub comparison: Widget<AceComparison>,
    pub tiles: Widget<Vec<Tile>>,
    pub trend_chart: Widget<ChartData>,
    pub top_bottom_chart: Widget<ChartData>,
}

/// Embedded content of a narrative section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Embed {
    Document(Document),
    TargetList(TargetList),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySection {
    pub heading: Option<String>,
    pub paragraphs: Vec<String>,
    pub embeds: Vec<Widget<Embed>>,
    pub callout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryPage {
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub sections: Vec<StorySection>,
}
