pub mod cli;
pub mod core;
pub mod providers;
pub mod router;
pub mod storage;
