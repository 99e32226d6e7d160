//! Event rendering: compact and verbose text forms, with optional color.

pub mod render;

#[cfg(test)]
mod tests;

pub use render::{DisplayMode, Palette, Render, severity_style, status_style};
