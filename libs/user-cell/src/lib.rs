// =====================================================================================
// USER CELL - USUARIOS, ROLES, PERMISOS, ADMINISTRADORES, COMPONENTES UI
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Role, UserAccount, UserError, UserResponse, UserType, permission_codes};
pub use router::{
    administrator_routes, component_routes, permission_routes, role_routes, user_routes,
};
pub use services::{ComponentService, RoleService, UserService};
