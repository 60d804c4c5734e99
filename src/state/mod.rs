pub mod app_settings;
pub mod hot;
pub mod messages;
pub mod network;
pub mod notify;
pub mod poller;
pub mod refresher;
pub mod votes;
