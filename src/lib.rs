pub mod audience;
pub mod config;
pub mod domain;
pub mod email_client;
pub mod lead_store;
pub mod notifier;
pub mod routes;
pub mod startup;
pub mod telemetry;
