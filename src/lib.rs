pub mod admin;
pub mod configuration;
pub mod domain;
pub mod entry_point;
pub mod messages;
pub mod routes;
pub mod startup;
pub mod store;
pub mod subscription;
pub mod telemetry;
