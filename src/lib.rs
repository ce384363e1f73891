// lib.rs
pub mod annotation;
pub mod commands;
pub mod config;
pub mod error;
pub mod files;
pub mod merge;
pub mod pair_reducer;
pub mod pairing;
pub mod partition;
pub mod qseq;
pub mod read_sort;
pub mod reference;
