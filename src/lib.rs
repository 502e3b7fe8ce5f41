pub mod book;
pub mod config;
pub mod crawler;
pub mod logger;
pub mod pdf;
pub mod platform;
pub mod utils;

pub use book::{Book, BookRequest, PageNames, ResolvedBook};
pub use config::Settings;
pub use crawler::{FlipbookCrawler, PageFolder};
pub use pdf::PdfAssembler;
pub use platform::Platform;
