pub mod cache;
pub mod event;
