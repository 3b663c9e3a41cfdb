pub mod archive;
pub mod conversion;
pub mod converter;
