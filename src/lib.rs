pub mod audit;
pub mod config;
pub mod descriptions;
pub mod images;
pub mod logging;
pub mod metadata;
pub mod rename;
pub mod upload;
