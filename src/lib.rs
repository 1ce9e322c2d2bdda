pub mod analyzers;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod headers;
pub mod inspection;
pub mod output;
pub mod structure;
pub mod table;
pub mod topology;
