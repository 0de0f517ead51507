pub mod activity;
pub mod chat;
pub mod mood;
