pub mod aggregate;
pub mod changelog;
pub mod ci_report;
pub mod config;
pub mod hooks;
pub mod inspect;
pub mod migrate;
