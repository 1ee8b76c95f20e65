pub mod category_cache;

pub use category_cache::CategoryCache;
