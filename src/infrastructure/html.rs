// HTML page rendering
use crate::application::story_service::StoryChapter;
use crate::domain::chart::ChartData;
use crate::domain::dashboard::{
    Embed, Notice, OverviewPage, PerformancePage, StoryPage, Tile, Widget,
};
use crate::domain::filter::FilterSelection;
use crate::domain::performance::PerformanceMetric;
use crate::domain::target_list::TargetList;
use crate::infrastructure::vega_mapper::chart_to_vega;

const STYLE: &str = r#"
        * { box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; display: flex; color: #1f2933; }
        nav { width: 260px; min-height: 100vh; background: #f4f5f7; padding: 1.5rem 1rem; }
        nav h2 { font-size: 1rem; margin-top: 0; }
        nav a { display: block; padding: 0.35rem 0.5rem; color: #1f2933; text-decoration: none; border-radius: 4px; }
        nav a:hover { background: #e4e7eb; }
        nav .about { font-size: 0.8rem; color: #52606d; margin-top: 1.5rem; }
        main { flex: 1; padding: 2rem; max-width: 1400px; }
        .filters, .tiles { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
        .filters label { font-size: 0.85rem; display: block; margin-bottom: 0.25rem; }
        .filters select { width: 100%; padding: 0.4rem; }
        .tile { background: #fff5f0; border-radius: 8px; padding: 1rem; }
        .tile .label { font-size: 0.85rem; color: #52606d; }
        .tile .value { font-size: 2rem; font-weight: 600; }
        .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(480px, 1fr)); gap: 1.5rem; margin-bottom: 1.5rem; }
        .chart { min-height: 440px; }
        .notice { background: #fff3cd; border-left: 4px solid #f0ad4e; padding: 0.75rem 1rem; margin: 0.5rem 0; }
        .empty { color: #7b8794; font-style: italic; padding: 1rem 0; }
        .callout { background: #e3f2fd; border-left: 4px solid #2196f3; padding: 0.75rem 1rem; margin: 1rem 0; }
        iframe { width: 100%; border: 0; }
        img { max-width: 100%; }
        table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
        th, td { padding: 0.4rem 0.6rem; border-bottom: 1px solid #e4e7eb; text-align: left; }
"#;

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn nav() -> String {
    let mut html = String::from("    <nav>\n        <h2>NYC Bus Violations</h2>\n");
    html.push_str("        <a href=\"/\">Home</a>\n");
    html.push_str("        <a href=\"/overview\">Overview</a>\n");
    html.push_str("        <a href=\"/map\">Hotspots Map</a>\n");
    html.push_str("        <a href=\"/performance\">ACE &amp; Bus Performance</a>\n");
    html.push_str("        <h2 style=\"margin-top:1.5rem\">The ClearLane Story</h2>\n");
    for chapter in StoryChapter::ALL {
        html.push_str(&format!(
            "        <a href=\"/story/{}\">{}</a>\n",
            chapter.slug(),
            escape(chapter.nav_label())
        ));
    }
    html.push_str(
        "        <p class=\"about\">A data-driven strategy to improve MTA bus service by focusing \
         on the routes most critical to CUNY students.</p>\n    </nav>\n",
    );
    html
}

fn layout(title: &str, body: &str, with_charts: bool) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>{}</style>
"#,
        escape(title),
        STYLE
    ));
    if with_charts {
        html.push_str(
            r#"    <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
    <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
    <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
"#,
        );
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(&nav());
    html.push_str("    <main>\n");
    html.push_str(body);
    html.push_str("    </main>\n</body>\n</html>\n");
    html
}

fn notice(notice: &Notice) -> String {
    format!(
        "        <div class=\"notice\"><strong>{}</strong>: {}</div>\n",
        escape(&notice.artifact),
        escape(&notice.message)
    )
}

fn chart(widget: &Widget<ChartData>) -> String {
    match widget {
        Widget::Ready(chart) => {
            // Chart JSON must not close the script element.
            let vega = chart_to_vega(chart).to_string().replace("</", "<\\/");
            format!(
                "        <div class=\"chart\" id=\"chart-{id}\"></div>\n        \
                 <script>vegaEmbed('#chart-{id}', {vega}, {{actions: false}});</script>\n",
                id = escape(&chart.id),
                vega = vega
            )
        }
        Widget::Empty => "        <div class=\"empty\">No violations match the selected filters.</div>\n".to_string(),
        Widget::Unavailable(n) => notice(n),
    }
}

fn tiles(widget: &Widget<Vec<Tile>>) -> String {
    match widget {
        Widget::Ready(tiles) => {
            let mut html = String::from("        <div class=\"tiles\">\n");
            for tile in tiles {
                html.push_str(&format!(
                    "            <div class=\"tile\" id=\"{}\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>\n",
                    escape(&tile.id),
                    escape(&tile.title),
                    escape(&tile.value)
                ));
            }
            html.push_str("        </div>\n");
            html
        }
        Widget::Empty => String::new(),
        Widget::Unavailable(n) => notice(n),
    }
}

fn select(name: &str, label: &str, options: &[String], selected: &str) -> String {
    let mut html = format!(
        "            <div><label for=\"{name}\">{label}</label><select id=\"{name}\" name=\"{name}\" onchange=\"this.form.submit()\">\n",
        name = name,
        label = escape(label)
    );
    for option in options {
        html.push_str(&format!(
            "                <option value=\"{v}\"{s}>{v}</option>\n",
            v = escape(option),
            s = if option == selected { " selected" } else { "" }
        ));
    }
    html.push_str("            </select></div>\n");
    html
}

/// Query string reproducing `selection`, with "All" choices left out.
pub fn selection_query(selection: &FilterSelection) -> String {
    let pairs = [
        ("month", selection.month.is_all(), selection.month.to_string()),
        ("weekday", selection.weekday.is_all(), selection.weekday.to_string()),
        ("route", selection.route.is_all(), selection.route.to_string()),
        (
            "violation_type",
            selection.violation_type.is_all(),
            selection.violation_type.to_string(),
        ),
    ];
    let query: Vec<String> = pairs
        .iter()
        .filter(|(_, all, _)| !all)
        .map(|(key, _, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    if query.is_empty() {
        String::new()
    } else {
        format!("?{}", query.join("&"))
    }
}

pub fn home_page() -> String {
    let body = r#"        <h1>NYC Bus Violations Dashboard</h1>
        <p>Welcome to the <strong>NYC Bus Violations Analytics Dashboard</strong>. Use the navigation to explore:</p>
        <ul>
            <li><a href="/overview">Overview</a>: summary KPIs, time patterns and top hotspots</li>
            <li><a href="/map">Hotspots Map</a>: interactive map with routes and violations</li>
            <li><a href="/performance">ACE &amp; Bus Performance</a>: bus speeds before and after camera enforcement</li>
            <li><a href="/story/rolling-study-hall">The ClearLane Story</a>: from data to a deployable enforcement strategy</li>
        </ul>
"#;
    layout("NYC Bus Violations", body, false)
}

pub fn overview_page(page: &OverviewPage) -> String {
    let mut body = format!("        <h1>{}</h1>\n", escape(&page.title));

    body.push_str("        <form class=\"filters\" method=\"get\" action=\"/overview\">\n");
    body.push_str(&select(
        "month",
        "Filter by Month",
        &page.options.months,
        &page.selection.month.to_string(),
    ));
    body.push_str(&select(
        "weekday",
        "Filter by Weekday",
        &page.options.weekdays,
        &page.selection.weekday.to_string(),
    ));
    body.push_str(&select(
        "route",
        "Filter by Bus Route",
        &page.options.routes,
        &page.selection.route.to_string(),
    ));
    body.push_str(&select(
        "violation_type",
        "Filter by Violation Type",
        &page.options.violation_types,
        &page.selection.violation_type.to_string(),
    ));
    body.push_str("            <noscript><button type=\"submit\">Apply</button></noscript>\n        </form>\n");

    body.push_str(&format!(
        "        <p><a href=\"/api/overview{}\">View this selection as JSON</a></p>\n",
        escape(&selection_query(&page.selection))
    ));
    body.push_str(&tiles(&page.tiles));

    body.push_str("        <div class=\"grid\">\n");
    body.push_str(&chart(&page.weekday_chart));
    body.push_str(&chart(&page.hourly_chart));
    body.push_str("        </div>\n        <div class=\"grid\">\n");
    body.push_str("        <div><h3>Top Stops with Most Violations</h3>\n");
    body.push_str(&chart(&page.top_stops_chart));
    body.push_str("        </div>\n        <div><h3>When Do Violations Spike?</h3>\n");
    body.push_str(&chart(&page.heatmap));
    body.push_str("        </div>\n        </div>\n");
    body.push_str("        <h3>Violations by Month</h3>\n");
    body.push_str(&chart(&page.monthly_chart));

    layout(&page.title, &body, true)
}

pub fn performance_page(page: &PerformancePage) -> String {
    let mut body = format!("        <h1>{}</h1>\n", escape(&page.title));

    let selected_route = page
        .comparison
        .ready()
        .map(|c| c.route_id.clone())
        .unwrap_or_default();
    body.push_str("        <form class=\"filters\" method=\"get\" action=\"/performance\">\n");
    body.push_str(&select("route", "Select Bus Route", &page.routes, &selected_route));

    body.push_str("            <div><label for=\"metric\">Metric to Plot</label><select id=\"metric\" name=\"metric\" onchange=\"this.form.submit()\">\n");
    for metric in PerformanceMetric::ALL {
        body.push_str(&format!(
            "                <option value=\"{}\"{}>{}</option>\n",
            metric.slug(),
            if metric == page.metric { " selected" } else { "" },
            escape(metric.title())
        ));
    }
    body.push_str("            </select></div>\n");
    body.push_str("            <noscript><button type=\"submit\">Apply</button></noscript>\n        </form>\n");

    match &page.comparison {
        Widget::Unavailable(n) => body.push_str(&notice(n)),
        Widget::Empty => body.push_str("        <div class=\"empty\">No observations for this route.</div>\n"),
        Widget::Ready(_) => {
            body.push_str(&tiles(&page.tiles));
            body.push_str(&chart(&page.trend_chart));
        }
    }

    body.push_str("        <h3>Top/Bottom Routes by Speed Change</h3>\n");
    body.push_str(&chart(&page.top_bottom_chart));

    layout(&page.title, &body, true)
}

fn target_table(targets: &TargetList) -> String {
    let mut html = String::from("        <table>\n            <thead><tr>");
    for column in &targets.columns {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    html.push_str("</tr></thead>\n            <tbody>\n");
    for row in &targets.rows {
        html.push_str("                <tr>");
        for (i, cell) in row.cells.iter().enumerate() {
            if i == targets.score_column {
                html.push_str(&format!(
                    "<td style=\"background:{};color:{}\">{}</td>",
                    row.background,
                    row.text_color,
                    escape(cell)
                ));
            } else {
                html.push_str(&format!("<td>{}</td>", escape(cell)));
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("            </tbody>\n        </table>\n");
    html
}

fn embed(widget: &Widget<Embed>) -> String {
    match widget {
        Widget::Ready(Embed::Document(document)) if document.is_image() => format!(
            "        <img src=\"/artifacts/{}\" alt=\"{}\">\n",
            document.file_name(),
            document.file_name()
        ),
        Widget::Ready(Embed::Document(document)) => format!(
            "        <iframe src=\"/artifacts/{}\" height=\"{}\" loading=\"lazy\"></iframe>\n",
            document.file_name(),
            document.frame_height()
        ),
        Widget::Ready(Embed::TargetList(targets)) => target_table(targets),
        Widget::Empty => "        <div class=\"empty\">Nothing to show.</div>\n".to_string(),
        Widget::Unavailable(n) => notice(n),
    }
}

pub fn story_page(page: &StoryPage) -> String {
    let mut body = format!("        <h1>{}</h1>\n", escape(&page.title));
    if let Some(subtitle) = &page.subtitle {
        body.push_str(&format!("        <h2>{}</h2>\n", escape(subtitle)));
    }
    for section in &page.sections {
        if let Some(heading) = &section.heading {
            body.push_str(&format!("        <h3>{}</h3>\n", escape(heading)));
        }
        for paragraph in &section.paragraphs {
            body.push_str(&format!("        <p>{}</p>\n", escape(paragraph)));
        }
        for widget in &section.embeds {
            body.push_str(&embed(widget));
        }
        if let Some(callout) = &section.callout {
            body.push_str(&format!("        <div class=\"callout\">{}</div>\n", escape(callout)));
        }
    }
    layout(&page.title, &body, false)
}

pub fn map_page(widget: &Widget<Embed>) -> String {
    let mut body = String::from("        <h1>Interactive Map of Bus Violations</h1>\n");
    body.push_str(&embed(widget));
    layout("Interactive Map of Bus Violations", &body, false)
}

pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "        <h1>{}</h1>\n        <div class=\"notice\">{}</div>\n",
        escape(title),
        escape(message)
    );
    layout(title, &body, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::Document;
    use crate::domain::chart::{ChartKind, ChartPoint};
    use crate::domain::filter::FilterOptions;

    fn overview(weekday_chart: Widget<ChartData>) -> OverviewPage {
        OverviewPage {
            title: "NYC Bus Violations Overview".to_string(),
            selection: FilterSelection::default().with_route("M15"),
            options: FilterOptions {
                months: vec!["All".to_string(), "2024-01".to_string()],
                weekdays: vec!["All".to_string(), "Monday".to_string()],
                routes: vec!["All".to_string(), "M15".to_string()],
                violation_types: vec!["All".to_string()],
            },
            summary: Widget::Empty,
            tiles: Widget::Ready(vec![Tile::new("peak_hour", "Peak Hour", "-".to_string())]),
            weekday_chart,
            hourly_chart: Widget::Empty,
            monthly_chart: Widget::Empty,
            top_stops_chart: Widget::Unavailable(Notice {
                artifact: "stop_counts.csv".to_string(),
                message: "stop_counts.csv was not found.".to_string(),
            }),
            heatmap: Widget::Empty,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_overview_marks_selection_and_notices() {
        let chart = ChartData::new("weekday", "By Day", ChartKind::Bar, "Day", "Violations")
            .with_points(vec![ChartPoint::new("</script>".to_string(), 1.0)]);
        let html = overview_page(&overview(Widget::Ready(chart)));

        assert!(html.contains("<option value=\"M15\" selected>M15</option>"));
        assert!(html.contains("<option value=\"All\" selected>All</option>"));
        assert!(html.contains("stop_counts.csv was not found."));
        assert!(html.contains("vegaEmbed('#chart-weekday'"));
        assert!(!html.contains("\"</script>\""));
        assert!(html.contains("No violations match the selected filters."));
    }

    #[test]
    fn test_selection_query_encodes_values() {
        assert_eq!(selection_query(&FilterSelection::default()), "");
        let selection = FilterSelection::default()
            .with_route("BX12+")
            .with_violation_type("MOBILE BUS STOP");
        assert_eq!(
            selection_query(&selection),
            "?route=BX12%2B&violation_type=MOBILE%20BUS%20STOP"
        );
    }

    #[test]
    fn test_embeds() {
        let image = embed(&Widget::Ready(Embed::Document(Document::HourlyPlot)));
        assert!(image.contains("<img src=\"/artifacts/exempt_violations_by_hour.png\""));

        let frame = embed(&Widget::Ready(Embed::Document(Document::RouteMap3d)));
        assert!(frame.contains("height=\"700\""));
    }

    #[test]
    fn test_target_table_colors_score_cell() {
        let targets = TargetList::new(
            vec!["stop_name".to_string(), "ClearLane Priority Score".to_string()],
            1,
            vec![vec!["W 125 ST & BWAY".to_string(), "1".to_string()]],
            vec![1.0],
        );
        let html = target_table(&targets);
        assert!(html.contains("<td>W 125 ST &amp; BWAY</td>"));
        assert!(html.contains("<td style=\"background:#fff5f0;color:#000000\">1</td>"));
    }
}
