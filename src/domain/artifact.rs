// Pre-rendered documents embedded as opaque blobs
use serde::Serialize;

/// Where an artifact lives relative to the configured directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactDir {
    Data,
    Visualizations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Document {
    BusMap,
    HotspotsMap,
    HourlyPlot,
    DailyPlot,
    RouteMap3d,
}

impl Document {
    pub const ALL: [Document; 5] = [
        Document::BusMap,
        Document::HotspotsMap,
        Document::HourlyPlot,
        Document::DailyPlot,
        Document::RouteMap3d,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Document::BusMap => "bus_map.html",
            Document::HotspotsMap => "exempt_hotspots_map.html",
            Document::HourlyPlot => "exempt_violations_by_hour.png",
            Document::DailyPlot => "exempt_violations_by_day.png",
            Document::RouteMap3d => "interactive_3d_map.html",
        }
    }

    pub fn dir(self) -> ArtifactDir {
        match self {
            Document::BusMap => ArtifactDir::Data,
            _ => ArtifactDir::Visualizations,
        }
    }

    pub fn content_type(self) -> &'static str {
        if self.is_image() {
            "image/png"
        } else {
            "text/html; charset=utf-8"
        }
    }

    pub fn is_image(self) -> bool {
        self.file_name().ends_with(".png")
    }

    /// Height of the frame the document is embedded in.
    pub fn frame_height(self) -> u32 {
        match self {
            Document::BusMap => 800,
            Document::RouteMap3d => 700,
            _ => 500,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Document::ALL.into_iter().find(|d| d.file_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_file_name() {
        assert_eq!(
            Document::from_file_name("interactive_3d_map.html"),
            Some(Document::RouteMap3d)
        );
        assert_eq!(Document::from_file_name("../secrets.txt"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(Document::DailyPlot.content_type(), "image/png");
        assert!(Document::BusMap.content_type().starts_with("text/html"));
        assert_eq!(Document::BusMap.dir(), ArtifactDir::Data);
    }
}
