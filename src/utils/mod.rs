mod logger;

pub use logger::logger_init;
