pub mod adapters;
pub mod authentication;
pub mod broadcast;
pub mod clock;
pub mod configuration;
pub mod domain;
pub mod notifications;
pub mod registry;
pub mod routes;
pub mod session_state;
pub mod startup;
pub mod utils;
