pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::AuthError;
pub use router::{profile_routes, token_routes};
pub use services::{LoginService, TokenService};
