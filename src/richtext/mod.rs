pub mod text_soup;
pub mod text_span;

pub mod font;
pub mod text_block;

pub mod document;
pub mod hooks;

pub mod caret;
pub mod geometry;
pub mod remote;

pub mod clipboard;
pub mod editor;

pub mod config;
pub mod error;
