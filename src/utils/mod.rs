pub mod config;
pub(crate) mod constants;
pub mod fft;
