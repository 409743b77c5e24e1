//! Filter-and-aggregate pipeline over train delay and accident records.
//!
//! Load the two datasets once ([`cache::DatasetCache`]), narrow them with
//! user criteria ([`data::filter`]), and derive the top-N grouped means and
//! KPIs ([`data::aggregate`], [`data::summary`]) a presentation layer shows.

pub mod cache;
pub mod config;
pub mod criteria;
pub mod data;
pub mod error;
pub mod report;
pub mod state;

pub use error::{PipelineError, Result};
