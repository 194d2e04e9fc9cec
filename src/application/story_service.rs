// Story service - The narrative chapters of the ClearLane argument
use crate::application::artifact_repository::ArtifactRepository;
use crate::domain::artifact::Document;
use crate::domain::dashboard::{Embed, Notice, StoryPage, StorySection, Widget};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryChapter {
    RollingStudyHall,
    LocalAndPredictable,
    RouteMap3d,
    ClearLaneSolution,
}

impl StoryChapter {
    pub const ALL: [StoryChapter; 4] = [
        StoryChapter::RollingStudyHall,
        StoryChapter::LocalAndPredictable,
        StoryChapter::RouteMap3d,
        StoryChapter::ClearLaneSolution,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            StoryChapter::RollingStudyHall => "rolling-study-hall",
            StoryChapter::LocalAndPredictable => "local-and-predictable",
            StoryChapter::RouteMap3d => "route-map-3d",
            StoryChapter::ClearLaneSolution => "clearlane-solution",
        }
    }

    pub fn nav_label(self) -> &'static str {
        match self {
            StoryChapter::RollingStudyHall => "The Rolling Study Hall",
            StoryChapter::LocalAndPredictable => "The Problem is Local & Predictable",
            StoryChapter::RouteMap3d => "Interactive 3D Bus Route Map",
            StoryChapter::ClearLaneSolution => "The 'ClearLane' Solution",
        }
    }
}

impl fmt::Display for StoryChapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for StoryChapter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoryChapter::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("unknown chapter '{s}'"))
    }
}

fn section(heading: Option<&str>, paragraphs: &[&str]) -> StorySection {
    StorySection {
        heading: heading.map(str::to_string),
        paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        embeds: Vec::new(),
        callout: None,
    }
}

#[derive(Clone)]
pub struct StoryService {
    repository: Arc<dyn ArtifactRepository>,
}

impl StoryService {
    pub fn new(repository: Arc<dyn ArtifactRepository>) -> Self {
        Self { repository }
    }

    async fn embed_document(&self, document: Document) -> Widget<Embed> {
        if self.repository.has_document(document).await {
            Widget::Ready(Embed::Document(document))
        } else {
            tracing::warn!("Document {} not found", document.file_name());
            Widget::Unavailable(Notice {
                artifact: document.file_name().to_string(),
                message: format!(
                    "{} was not found. Generate it from the analysis notebooks and reload.",
                    document.file_name()
                ),
            })
        }
    }

    async fn embed_target_list(&self) -> Widget<Embed> {
        match self.repository.target_list().await {
            Ok(targets) if targets.rows.is_empty() => Widget::Empty,
            Ok(targets) => Widget::Ready(Embed::TargetList(targets.as_ref().clone())),
            Err(e) => {
                tracing::warn!("Target list unavailable: {}", e);
                Widget::Unavailable(e.to_notice())
            }
        }
    }

    /// The standalone interactive map of violations along bus routes.
    pub async fn bus_map(&self) -> Widget<Embed> {
        self.embed_document(Document::BusMap).await
    }

    pub async fn page(&self, chapter: StoryChapter) -> StoryPage {
        match chapter {
            StoryChapter::RollingStudyHall => {
                let mut intro = section(
                    None,
                    &[
                        "For thousands of CUNY students the daily bus commute is a quiet window for \
                         learning: a rolling study hall for exams, homework and reading.",
                        "Chronic delays caused by blocked bus lanes and stops eat into that time. \
                         This project uses the MTA's own enforcement data to find where and when \
                         to protect it.",
                    ],
                );
                intro.callout = Some(
                    "Use the navigation to follow the journey from data to a deployable solution."
                        .to_string(),
                );
                StoryPage {
                    slug: chapter.slug().to_string(),
                    title: "Protecting the Rolling Study Hall".to_string(),
                    subtitle: Some("A Student-Centric Strategy to Get NYC Buses on Time".to_string()),
                    sections: vec![intro],
                }
            }
            StoryChapter::LocalAndPredictable => {
                let intro = section(
                    None,
                    &["Across 3.7 million violations the problem is hyper-concentrated: a small \
                       number of chronic, exempt-vehicle offenders at specific locations."],
                );
                let mut map = section(
                    Some("Interactive Hotspot Map"),
                    &["The top 100 hotspots for exempt vehicle violations, with CUNY campuses \
                       marked for reference."],
                );
                map.embeds.push(self.embed_document(Document::HotspotsMap).await);

                let mut timing = section(
                    Some("...And It Happens Like Clockwork"),
                    &["Blockages peak on weekday mornings between 7 AM and 10 AM, exactly when \
                       students are travelling to class."],
                );
                timing.embeds.push(self.embed_document(Document::HourlyPlot).await);
                timing.embeds.push(self.embed_document(Document::DailyPlot).await);

                StoryPage {
                    slug: chapter.slug().to_string(),
                    title: "The Problem Isn't Everywhere, It's Somewhere".to_string(),
                    subtitle: None,
                    sections: vec![intro, map, timing],
                }
            }
            StoryChapter::RouteMap3d => {
                let mut map = section(
                    None,
                    &[
                        "Line color shows average bus speed (red is slow, green is fast).",
                        "Segment height shows the number of violations recorded on that segment.",
                    ],
                );
                map.embeds.push(self.embed_document(Document::RouteMap3d).await);
                map.callout = Some(
                    "Drag to pan, scroll to zoom, hold Ctrl and drag to rotate, click a segment \
                     for route details."
                        .to_string(),
                );
                StoryPage {
                    slug: chapter.slug().to_string(),
                    title: "3D Bus Route Visualization".to_string(),
                    subtitle: Some(
                        "Bus Segments Colored by Speed, Extruded by Violation Counts".to_string(),
                    ),
                    sections: vec![map],
                }
            }
            StoryChapter::ClearLaneSolution => {
                let mut targets = section(
                    None,
                    &["The ClearLane Target List combines violation counts, temporal patterns and \
                       CUNY proximity into a single priority score: the exact stops that need \
                       enforcement and the weekday-morning window to deploy it."],
                );
                targets.embeds.push(self.embed_target_list().await);

                let mut impact = section(Some("Expected Impact"), &[]);
                impact.callout = Some(
                    "Piloting enforcement at the top locations gives a surgical, high-impact \
                     return on enforcement resources and faster buses for everyone."
                        .to_string(),
                );
                StoryPage {
                    slug: chapter.slug().to_string(),
                    title: "The 'ClearLane' Initiative".to_string(),
                    subtitle: Some("From Data to a Deployable Strategy".to_string()),
                    sections: vec![targets, impact],
                }
            }
        }
    }
}
