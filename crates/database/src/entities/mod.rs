pub mod oauth_account;
pub mod session;

pub use oauth_account::OAuthLink;
pub use session::SessionRecord;
