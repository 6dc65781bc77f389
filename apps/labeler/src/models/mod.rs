pub mod image;
pub mod label;
