pub mod container;
pub mod ooxml;
pub mod styles;
pub mod writer;
mod xml;
