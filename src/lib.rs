//! Event Wizard: conversational intake for event-service bookings.

pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod notify;
pub mod routes;
pub mod store;
pub mod submission;
pub mod wizard;
