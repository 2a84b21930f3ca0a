pub mod export_service;
pub mod migration_service;
pub mod reminder_service;
pub mod stats_service;
pub mod trip_service;
