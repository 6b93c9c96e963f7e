pub mod capitalization;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod output;
pub mod refresh;
pub mod resolver;
pub mod store;
