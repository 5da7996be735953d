//! Speech synthesis engines.
//!
//! # Available Engines
//!
//! - [`espeak`] - English through the espeak-ng command line
//! - [`tacotron`] - Persian through an external Tacotron2 inference script

pub mod espeak;
pub mod tacotron;

pub use espeak::EspeakSynthesizer;
pub use tacotron::TacotronSynthesizer;
