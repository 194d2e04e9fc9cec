// Application layer - Use cases over the artifact repository
pub mod artifact_repository;
pub mod error;
pub mod overview_service;
pub mod performance_service;
pub mod story_service;
