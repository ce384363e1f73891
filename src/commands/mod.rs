pub mod merge;
pub mod pair_reads;
pub mod read_sort;
