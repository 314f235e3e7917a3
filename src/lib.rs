pub mod climate;
pub mod command;
pub mod dashboard;
pub mod db;
pub mod forecast;
pub mod report;
pub mod resample;
pub mod session;
