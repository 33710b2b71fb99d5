pub mod backend;
pub mod filter;
pub mod paths;
pub mod scanner;
pub mod templates;
pub mod tree;
