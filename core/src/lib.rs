//! SLA desk core: deadline tracking and escalation for helpdesk tickets.
//!
//! `sla` and `selectors` are pure read-side derivations; `ticket_book` holds
//! the only mutation API; `engine` serializes commands and ticks over both;
//! `scheduler` drives the engine from a periodic tokio task.

pub mod clock;
pub mod command;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod event;
pub mod intake;
pub mod name_generator;
pub mod notification;
pub mod rng;
pub mod scheduler;
pub mod selectors;
pub mod sla;
pub mod snapshot;
pub mod store;
pub mod ticket;
pub mod ticket_book;
pub mod types;
