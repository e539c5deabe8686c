pub mod category;
pub mod channel;
pub mod server;
pub mod server_member;
pub mod user;
