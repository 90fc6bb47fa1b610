pub mod assembler;
pub mod decoder;
pub mod stacker;
