pub mod address;
pub mod config;
pub mod error;
pub mod excel;
pub mod field;
pub mod item;
pub mod layout;
pub mod parser;
pub mod path_policy;
pub mod registry;
pub mod service;
pub mod summary;
pub mod template;
