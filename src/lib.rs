pub mod authorization;
pub mod availability;
pub mod config;
pub mod consts;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod reports;
pub mod routing;
pub mod seed;
pub mod services;
pub mod stores;
pub mod transitions;
pub mod utils;
