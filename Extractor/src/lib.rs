pub mod args;
pub mod info;
