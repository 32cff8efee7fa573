//! Identifier and boundary generation

pub mod random;

pub use random::{generate_boundary, random_id, random_id_with_source, secure_random_available, IdSource};
