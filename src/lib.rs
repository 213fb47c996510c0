pub mod authentication;
pub mod config;
pub mod domain;
pub mod email_client;
pub mod listing;
pub mod notification;
pub mod publish;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
