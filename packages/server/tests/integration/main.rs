mod category;
mod channel;
mod common;
mod server;
