pub mod app;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod eutils;
pub mod normalize;
