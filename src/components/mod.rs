pub mod dialog;
pub mod editor;
pub mod help;
pub mod status_bar;
pub mod tag_bar;
pub mod tree;
