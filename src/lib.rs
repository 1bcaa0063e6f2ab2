pub mod config;
pub mod controller;
pub mod crawler;
pub mod emitter;
pub mod error;
pub mod logger;
pub mod page;
pub mod shield;
pub mod utils;

pub use controller::{Controller, Outcome, Prompter};
pub use crawler::{ChapterFetcher, HttpChapterFetcher};
pub use emitter::{DownloadSink, FsSink};
pub use error::FetchError;
pub use page::{DocumentReader, HtmlDocument};
pub use utils::get_user_input;
