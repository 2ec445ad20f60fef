//! Data layer for Ultima V conversation scripts: the compressed word
//! dictionary, the .TLK byte-stream decoder, the structured talk script
//! model (fixed slots, labels, question/answer tables), section splitting
//! for playback, and the keyword lookup surface.

#[macro_use]
extern crate lazy_static;

pub mod compressed_words;
pub mod error;
pub mod extortion;
pub mod lexer;
pub mod script;
pub mod talk_command;
pub mod talk_files;
pub mod talk_script;
