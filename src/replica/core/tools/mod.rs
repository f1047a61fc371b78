pub mod compress;
pub mod stable_hash;
pub mod utils;
