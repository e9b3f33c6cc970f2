// src/lib.rs
pub mod completion;
pub mod config;
pub mod display;
pub mod entry_factory;
pub mod errors;
pub mod event;
pub mod feed;
pub mod feed_download;
pub mod feed_loader;
pub mod logging;

pub mod checks;
pub mod opml;
