pub mod newsapi;
pub mod rss;
