pub mod cleanup;
pub mod text;
