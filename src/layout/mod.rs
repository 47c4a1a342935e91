pub mod clear;
pub mod dynamic;
pub mod fill;
pub mod group;
pub mod locate;
pub mod rows;
pub mod summary;
