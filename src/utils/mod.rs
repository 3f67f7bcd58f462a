// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod atomic;
pub mod logging;
pub mod validation;

pub use atomic::AtomicFile;
pub use validation::Validator;
