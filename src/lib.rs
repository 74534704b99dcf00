//! yoked - fleet check-in and user provisioning service
//!
//! Hosts check in with their name and network state; the service records them
//! and answers with the accounts they should provision, based on the groups
//! they belong to.

pub mod admin;
pub mod checkin;
pub mod entities;
pub mod errors;
pub mod projection;
pub mod resolver;
pub mod seed;
pub mod settings;
pub mod storage;
pub mod web;
