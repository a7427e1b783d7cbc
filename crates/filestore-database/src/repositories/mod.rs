//! PostgreSQL implementations of the store traits.

pub mod event;
pub mod file;
pub mod user;

pub use event::EventRepository;
pub use file::FileRepository;
pub use user::UserRepository;
