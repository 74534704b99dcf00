#![allow(dead_code)]

pub mod builders;
pub mod db;

pub use builders::{GroupBuilder, UserBuilder};
pub use db::TestDb;
