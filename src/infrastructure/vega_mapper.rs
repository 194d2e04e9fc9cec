// Mapper to convert chart data to Vega-Lite specifications
use crate::domain::chart::{ChartData, ChartKind};
use crate::domain::violation::Weekday;
use serde_json::{Value, json};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const CHART_HEIGHT: u32 = 400;

fn values(chart: &ChartData) -> Vec<Value> {
    chart
        .points
        .iter()
        .map(|p| match &p.y {
            Some(y) => json!({ "x": p.x, "y": y, "value": p.value }),
            None => json!({ "x": p.x, "value": p.value }),
        })
        .collect()
}

fn weekday_order() -> Vec<&'static str> {
    Weekday::ALL.iter().map(|d| d.name()).collect()
}

fn hour_order() -> Vec<String> {
    (0..24).map(|h: u8| h.to_string()).collect()
}

pub fn chart_to_vega(chart: &ChartData) -> Value {
    let mut spec = json!({
        "$schema": SCHEMA,
        "title": chart.title,
        "height": CHART_HEIGHT,
        "width": "container",
        "data": { "values": values(chart) },
    });

    let body = match chart.kind {
        ChartKind::Bar => bar(chart),
        ChartKind::RankedBar => ranked_bar(chart),
        ChartKind::Line => line(chart),
        ChartKind::Heatmap => heatmap(chart),
        ChartKind::Diverging => diverging(chart),
    };
    if let (Value::Object(spec), Value::Object(body)) = (&mut spec, body) {
        spec.extend(body);
    }
    spec
}

fn bar(chart: &ChartData) -> Value {
    let x = json!({ "field": "x", "type": "nominal", "title": chart.x_title, "sort": weekday_order() });
    let y = json!({ "field": "value", "type": "quantitative", "title": chart.y_title });
    json!({
        "layer": [
            {
                "mark": "bar",
                "encoding": {
                    "x": x,
                    "y": y,
                    "color": { "field": "value", "type": "quantitative", "scale": { "scheme": "reds" }, "legend": null },
                    "tooltip": [
                        { "field": "x", "title": chart.x_title },
                        { "field": "value", "title": chart.y_title, "format": ",.0f" }
                    ]
                }
            },
            {
                "mark": { "type": "text", "dy": -5, "color": "black" },
                "encoding": {
                    "x": x,
                    "y": y,
                    "text": { "field": "value", "type": "quantitative", "format": ",.0f" }
                }
            }
        ]
    })
}

fn ranked_bar(chart: &ChartData) -> Value {
    json!({
        "mark": "bar",
        "encoding": {
            "x": { "field": "value", "type": "quantitative", "title": chart.y_title },
            "y": { "field": "x", "type": "nominal", "title": chart.x_title, "sort": "-x" },
            "color": { "field": "value", "type": "quantitative", "scale": { "scheme": "reds" }, "legend": null },
            "tooltip": [
                { "field": "x", "title": chart.x_title },
                { "field": "value", "title": chart.y_title, "format": ",.0f" }
            ]
        }
    })
}

fn line(chart: &ChartData) -> Value {
    let has_series = chart.points.iter().any(|p| p.y.is_some());
    let mut y = json!({ "field": "value", "type": "quantitative", "title": chart.y_title });
    if let Some((lo, hi)) = chart.y_domain {
        y["scale"] = json!({ "domain": [lo, hi] });
    }

    let mut encoding = json!({
        "x": { "field": "x", "type": "ordinal", "title": chart.x_title, "sort": null },
        "y": y,
        "tooltip": [
            { "field": "x", "title": chart.x_title },
            { "field": "value", "title": chart.y_title }
        ]
    });
    if has_series {
        encoding["color"] = json!({
            "field": "y",
            "type": "nominal",
            "title": "ACE Active",
            "scale": { "domain": ["false", "true"], "range": ["#1f77b4", "#ff7f0e"] }
        });
    }

    json!({ "mark": { "type": "line", "point": true }, "encoding": encoding })
}

fn heatmap(chart: &ChartData) -> Value {
    json!({
        "mark": "rect",
        "encoding": {
            "x": { "field": "y", "type": "ordinal", "title": chart.x_title, "sort": hour_order() },
            "y": { "field": "x", "type": "nominal", "title": chart.y_title, "sort": weekday_order() },
            "color": { "field": "value", "type": "quantitative", "scale": { "scheme": "reds" }, "title": "Violations" },
            "tooltip": [
                { "field": "x", "title": chart.y_title },
                { "field": "y", "title": chart.x_title },
                { "field": "value", "title": "Violations", "format": ",.0f" }
            ]
        }
    })
}

fn diverging(chart: &ChartData) -> Value {
    json!({
        "mark": "bar",
        "encoding": {
            "x": { "field": "x", "type": "nominal", "title": chart.x_title, "sort": null },
            "y": { "field": "value", "type": "quantitative", "title": chart.y_title },
            "color": {
                "condition": { "test": "datum.value > 0", "value": "green" },
                "value": "red"
            },
            "tooltip": [
                { "field": "x", "title": chart.x_title },
                { "field": "value", "title": chart.y_title, "format": ".2f" }
            ]
        }
    })
}
