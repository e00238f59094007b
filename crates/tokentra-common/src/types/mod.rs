pub mod api_key;
pub mod attribution;
pub mod event;
pub mod usage;
