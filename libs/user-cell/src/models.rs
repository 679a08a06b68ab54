// =====================================================================================
// USER CELL MODELS - USUARIO, ROL, PERMISO, COMPONENTES UI
// =====================================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use security_cell::SecurityError;
use shared_models::error::AppError;

/// Permission codes checked by the user administration endpoints.
pub mod permission_codes {
    pub const VIEW_USERS: &str = "ver_usuarios";
    pub const CREATE_USERS: &str = "crear_usuarios";
    pub const EDIT_USERS: &str = "editar_usuarios";
}

/// Embedding used whenever a user is read back, so `rol` and `tipo_usuario` can be filled.
pub const USER_SELECT: &str = "*,rol:core_rol(*),medico:core_medico(usuario_id),paciente:core_paciente(usuario_id),administrador:core_administrador(usuario_id)";

pub const GENDERS: [&str; 2] = ["M", "F"];

// ==============================================================================
// ROLES & PERMISSIONS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: i64,
    pub nombre_rol: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub nombre_rol: Option<String>,
    pub descripcion: Option<String>,
}

/// Body of `PUT /roles/{id}/permisos/`. Kept as raw JSON so a non-list can be reported.
#[derive(Debug, Clone, Deserialize)]
pub struct RolePermissionsRequest {
    #[serde(default)]
    pub permisos: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub id: i64,
    pub nombre: String,
    pub codigo: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRequest {
    pub nombre: Option<String>,
    pub codigo: Option<String>,
    pub descripcion: Option<String>,
}

// ==============================================================================
// USERS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    Medico,
    Paciente,
    Administrador,
    Desconocido,
}

/// Row of `core_usuario` with its embedded role and profile markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub nombre: String,
    pub apellido: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub genero: Option<String>,
    pub activo: bool,
    #[serde(skip_serializing)]
    pub id_rol_id: i64,
    #[serde(default)]
    pub rol: Option<Role>,
    #[serde(default, skip_serializing)]
    pub medico: Option<Value>,
    #[serde(default, skip_serializing)]
    pub paciente: Option<Value>,
    #[serde(default, skip_serializing)]
    pub administrador: Option<Value>,
}

fn embedded(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(rows)) => !rows.is_empty(),
        Some(_) => true,
    }
}

impl UserAccount {
    /// Profile precedence is doctor, patient, administrator.
    pub fn user_type(&self) -> UserType {
        if embedded(&self.medico) {
            UserType::Medico
        } else if embedded(&self.paciente) {
            UserType::Paciente
        } else if embedded(&self.administrador) {
            UserType::Administrador
        } else {
            UserType::Desconocido
        }
    }

    pub fn role_name(&self) -> Option<&str> {
        self.rol.as_ref().map(|r| r.nombre_rol.as_str())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: UserAccount,
    pub tipo_usuario: UserType,
}

impl From<UserAccount> for UserResponse {
    fn from(user: UserAccount) -> Self {
        let tipo_usuario = user.user_type();
        Self { user, tipo_usuario }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub genero: Option<String>,
    pub activo: Option<bool>,
    pub id_rol: Option<i64>,
}

/// Partial update. `PUT` additionally requires the fields `CreateUserRequest` requires,
/// except the password.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub genero: Option<String>,
    pub activo: Option<bool>,
    pub id_rol: Option<i64>,
}

impl UpdateUserRequest {
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.email.is_none() {
            Some("email")
        } else if self.nombre.is_none() {
            Some("nombre")
        } else if self.apellido.is_none() {
            Some("apellido")
        } else if self.id_rol.is_none() {
            Some("id_rol")
        } else {
            None
        }
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub genero: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub email: Option<String>,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub telefono: Option<String>,
    pub activo: Option<bool>,
    pub genero: Option<String>,
    pub id_rol: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Row of `core_administrador` with its user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Administrator {
    #[serde(skip_serializing)]
    pub usuario_id: i64,
    pub usuario: UserAccount,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdministratorResponse {
    pub usuario: UserResponse,
}

impl From<Administrator> for AdministratorResponse {
    fn from(admin: Administrator) -> Self {
        Self {
            usuario: admin.usuario.into(),
        }
    }
}

// ==============================================================================
// UI COMPONENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentType {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiComponent {
    pub id: i64,
    pub codigo_componente: String,
    pub nombre_componente: String,
    pub modulo: Option<String>,
    pub ruta: Option<String>,
    pub icono: Option<String>,
    pub orden: i32,
    pub activo: bool,
    #[serde(default)]
    pub tipo_componente: Option<ComponentType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentAction {
    Ver,
    Crear,
    Editar,
    Eliminar,
    Todos,
}

impl ComponentAction {
    /// `todos` subsumes every other action.
    fn rank(self) -> u8 {
        match self {
            ComponentAction::Ver => 0,
            ComponentAction::Crear | ComponentAction::Editar => 1,
            ComponentAction::Eliminar => 2,
            ComponentAction::Todos => 3,
        }
    }

    pub fn broadest(self, other: ComponentAction) -> ComponentAction {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

/// Row of `core_permisocomponente` joined to its component.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionComponent {
    pub permiso_id: i64,
    pub accion_permitida: ComponentAction,
    pub componente: UiComponent,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantedComponent {
    #[serde(flatten)]
    pub componente: UiComponent,
    pub accion_permitida: ComponentAction,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Usuario no encontrado")]
    NotFound,

    #[error("Rol no encontrado")]
    RoleNotFound,

    #[error("Permiso no encontrado")]
    PermissionNotFound,

    #[error("Ya existe un usuario con este email")]
    EmailTaken,

    #[error("{0}")]
    Duplicate(String),

    #[error("Password inválido (mínimo 6 caracteres).")]
    InvalidPassword,

    #[error("El campo permisos debe ser una lista de IDs.")]
    InvalidPermissionList,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Security(#[from] SecurityError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        UserError::Database(err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound | UserError::RoleNotFound | UserError::PermissionNotFound => {
                AppError::NotFound(err.to_string())
            }
            UserError::EmailTaken | UserError::Duplicate(_) => AppError::Conflict(err.to_string()),
            UserError::InvalidPassword
            | UserError::InvalidPermissionList
            | UserError::Validation(_) => AppError::BadRequest(err.to_string()),
            UserError::Security(inner) => inner.into(),
            UserError::Database(msg) => AppError::Database(msg),
        }
    }
}
