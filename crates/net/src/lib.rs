#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for waypoint
//!
//! A single GraphQL client backs both remote concerns of an install: the
//! validation queries polled by the recipe validator and the status
//! documents written by the scoped status reporter. Requests are made once;
//! polling cadence belongs to the validator.

mod client;
mod documents;
mod query;

pub use client::{GraphQlClient, NetConfig};
