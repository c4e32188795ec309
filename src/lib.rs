pub mod autoplay;
pub mod board;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod mailbox;
pub mod notation;
pub mod uci;
pub mod view;
