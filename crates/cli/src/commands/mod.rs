pub mod chat;
pub mod seed;
