pub mod config;
pub mod driver;
pub mod message;
pub mod metrics;
pub mod report;
pub mod sample;
pub mod stats;
pub mod transport;
pub mod worker;
