pub mod api;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod humanize;
pub mod ledger;
pub mod observability;
pub mod remote;
pub mod storage;
pub mod worker;
