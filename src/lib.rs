pub mod boxscore;
pub mod config;
pub mod http_client;
pub mod last5;
pub mod lines;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod source;
pub mod window;
