//! rssnr lib test modules
pub mod toolkit;

mod matching;
