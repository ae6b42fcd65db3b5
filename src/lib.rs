//! costainka - schema initializer for the CostaDelInka hotel database
//!
//! Creates the eight collections of the reservation database with strict
//! `$jsonSchema` validators and their unique/sparse indexes, on top of an
//! embedded document store.

pub mod cli;
pub mod document;
pub mod initializer;
pub mod maintenance;
pub mod model;
pub mod observability;
pub mod store;
