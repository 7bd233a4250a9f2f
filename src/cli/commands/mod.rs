mod expand;
mod import;
mod suggest;

pub use expand::cmd_expand;
pub use import::cmd_import;
pub use suggest::cmd_suggest;
