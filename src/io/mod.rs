pub mod text;

pub use text::{write_matrix, write_vec, TokenReader};
