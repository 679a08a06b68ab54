pub mod component;
pub mod role;
pub mod user;

pub use component::ComponentService;
pub use role::RoleService;
pub use user::UserService;
