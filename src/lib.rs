pub mod analysis;
pub mod archive;
pub mod clock;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod guard;
pub mod logging;
pub mod measurements;
pub mod render;
pub mod service;
pub mod species;
