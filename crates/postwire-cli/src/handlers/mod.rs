#![deny(clippy::all, clippy::pedantic)]

pub mod comments;
pub mod diagnostics;
pub mod images;
pub mod posts;
