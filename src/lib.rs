pub mod render;
pub mod server;
pub mod version;
pub mod web;
