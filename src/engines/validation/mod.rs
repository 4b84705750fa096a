pub mod splitters;
