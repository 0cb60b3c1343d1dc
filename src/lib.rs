pub mod automation;
pub mod batch;
pub mod config;
pub mod content;
pub mod logger;
pub mod post;
pub mod publisher;
pub mod text_utils;
pub mod util;
mod test_data;
