// Application state for HTTP handlers
use crate::application::artifact_repository::ArtifactRepository;
use crate::application::overview_service::OverviewService;
use crate::application::performance_service::PerformanceService;
use crate::application::story_service::StoryService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub overview_service: OverviewService,
    pub performance_service: PerformanceService,
    pub story_service: StoryService,
    pub repository: Arc<dyn ArtifactRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn ArtifactRepository>, top_stop_limit: usize) -> Self {
        Self {
            overview_service: OverviewService::new(repository.clone(), top_stop_limit),
            performance_service: PerformanceService::new(repository.clone()),
            story_service: StoryService::new(repository.clone()),
            repository,
        }
    }
}
