mod database;
mod message_repo;
mod session_repo;

pub use database::Database;
pub use message_repo::MessageRepo;
pub use session_repo::SessionRepo;

#[cfg(test)]
mod tests;
