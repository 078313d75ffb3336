pub mod app;
pub mod config;
pub mod context;
pub mod models;
pub mod omdb;
pub mod search;
pub mod store;
pub mod views;
pub mod watchlist;
