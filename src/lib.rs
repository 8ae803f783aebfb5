pub mod app;
pub mod braille;
pub mod config;
pub mod context;
pub mod data;
pub mod link;
pub mod map;
pub mod stats;
pub mod summary;
pub mod ui;
