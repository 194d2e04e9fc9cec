// Repository trait for dashboard artifact access
use crate::application::error::Result;
use crate::domain::artifact::Document;
use crate::domain::performance::{RoutePerformance, RouteSpeedChange};
use crate::domain::target_list::TargetList;
use crate::domain::violation::{CountTable, TableKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Load one of the pre-aggregated violation count tables
    async fn count_table(&self, kind: TableKind) -> Result<Arc<CountTable>>;

    /// Load the ClearLane target list
    async fn target_list(&self) -> Result<Arc<TargetList>>;

    /// Load per-route monthly performance before and after enforcement
    async fn route_performance(&self) -> Result<Arc<Vec<RoutePerformance>>>;

    /// Load per-route speed changes
    async fn speed_changes(&self) -> Result<Arc<Vec<RouteSpeedChange>>>;

    /// Load a pre-rendered map or chart image verbatim
    async fn document(&self, document: Document) -> Result<Bytes>;

    /// Whether a pre-rendered document exists, without reading it
    async fn has_document(&self, document: Document) -> bool;
}
