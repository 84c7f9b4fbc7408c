//! Authentication collaborators

mod password;
mod session;
mod token;

pub use password::PasswordFlow;
pub use session::Session;
pub use token::AccessToken;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;
