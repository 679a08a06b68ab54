pub mod login;
pub mod token;

pub use login::LoginService;
pub use token::TokenService;
