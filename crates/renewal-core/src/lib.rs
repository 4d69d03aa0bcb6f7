pub mod allocator;
pub mod calendar;
pub mod config;
pub mod error;
pub mod feed;
pub mod io;
pub mod ledger;
pub mod paths;
pub mod policy;
pub mod record;
pub mod report;
pub mod sync;
pub mod types;

pub use error::{RenewalError, Result};
