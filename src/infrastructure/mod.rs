// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_repository;
pub mod html;
pub mod http_response;
pub mod table_cache;
pub mod vega_mapper;
