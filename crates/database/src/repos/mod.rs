pub mod account_repository;
pub mod session_repository;

pub use account_repository::AccountRepository;
pub use session_repository::SessionRepository;
