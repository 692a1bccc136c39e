//! Desktop shell for the Yandex Music web player: a command bridge that
//! drives the page's player API (or its keyboard shortcuts when the API is
//! missing) and reports playback back to the host.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod ipc;
pub mod models;
pub mod shell;
