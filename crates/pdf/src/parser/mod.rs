pub mod backend;
pub mod content;
pub mod graphics;
pub mod layout;
