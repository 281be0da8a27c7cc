#[macro_use]
pub mod logging;

pub mod app;
pub mod classify;
pub mod command;
pub mod io;
pub mod lcd;
pub mod logs;
pub mod session;
pub mod settings;
