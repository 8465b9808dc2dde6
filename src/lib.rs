// Library for tests to access modules

pub mod accumulator;
pub mod aggregation_worker;
pub mod backfill;
pub mod config;
pub mod error;
pub mod history_repo;
pub mod models;
pub mod monitor;
pub mod query;
pub mod routes;
pub mod sysinfo_repo;
pub mod version;
pub mod worker;
