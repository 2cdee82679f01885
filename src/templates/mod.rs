pub mod layouts;
pub mod pages;

pub use layouts::desktop_layout;
