#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
#[cfg(feature = "dataframe")]
pub mod io;
pub mod models;
pub mod providers;
pub mod requests;

pub use errors::Error;
pub use requests::historical::{run, Harvest, HarvestConfig, KlineHarvester};
