pub mod catalog;
pub mod error;
pub mod music_info;
pub mod rest_api;
pub mod state;
pub mod validate;
