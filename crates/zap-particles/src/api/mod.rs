pub mod emitter;
pub mod host;
pub mod persist;
