pub mod acquisition;
pub mod aggregate;
pub mod compare;
pub mod config;
pub mod listing;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod taxonomy;
pub mod trend;
pub mod views;
