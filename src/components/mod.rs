pub mod list;
pub mod status_bar;
pub mod tabs;
pub mod tree;
