pub mod currency;
pub mod in_memory;
