pub mod feed_loader;

pub use feed_loader::load_feed_file;
