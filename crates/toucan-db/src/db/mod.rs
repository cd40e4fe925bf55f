//! Store traits and their Postgres repositories

mod album;
mod photo;
mod stores;
pub mod transaction;
mod user;

pub use album::AlbumRepository;
pub use photo::PhotoRepository;
pub use stores::{AlbumStore, PhotoStore, UserStore};
pub use transaction::TransactionGuard;
pub use user::UserRepository;
