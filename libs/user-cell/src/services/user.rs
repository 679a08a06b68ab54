use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use security_cell::PasswordSecurityService;
use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{
    Administrator, CreateUserRequest, ProfileUpdateRequest, Role, UpdateUserRequest, UserAccount,
    UserError, UserListQuery, GENDERS, USER_SELECT,
};

const ORDERING_FIELDS: [&str; 5] = ["id", "email", "nombre", "apellido", "activo"];
const SEARCH_FIELDS: [&str; 4] = ["email", "nombre", "apellido", "telefono"];

pub struct UserService {
    db: PostgrestClient,
}

fn validate_gender(genero: Option<&str>) -> Result<(), UserError> {
    match genero {
        Some(g) if !GENDERS.contains(&g) => Err(UserError::Validation(format!(
            "\"{}\" no es una elección válida para genero.",
            g
        ))),
        _ => Ok(()),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, UserError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(UserError::Validation(format!("El campo {} es obligatorio.", field))),
    }
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_users(&self, query: UserListQuery) -> Result<Vec<UserAccount>, UserError> {
        let mut q = Query::new().select(USER_SELECT);
        if let Some(email) = query.email.as_deref() {
            q = q.eq("email", email);
        }
        if let Some(nombre) = query.nombre.as_deref() {
            q = q.eq("nombre", nombre);
        }
        if let Some(apellido) = query.apellido.as_deref() {
            q = q.eq("apellido", apellido);
        }
        if let Some(telefono) = query.telefono.as_deref() {
            q = q.eq("telefono", telefono);
        }
        if let Some(activo) = query.activo {
            q = q.eq("activo", activo);
        }
        if let Some(genero) = query.genero.as_deref() {
            q = q.eq("genero", genero);
        }
        if let Some(id_rol) = query.id_rol {
            q = q.eq("id_rol_id", id_rol);
        }
        if let Some(search) = query.search.as_deref() {
            q = q.search(&SEARCH_FIELDS, search);
        }
        let q = q
            .order_by_param(query.ordering.as_deref(), &ORDERING_FIELDS, "id")
            .paginate(query.limit, query.offset);

        Ok(self.db.select(tables::USERS, &q).await?)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<UserAccount, UserError> {
        let q = Query::new().select(USER_SELECT).eq("id", user_id);
        self.db
            .select_one(tables::USERS, &q)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Lookup used by the login flow; the stored hash is kept on the returned row.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, UserError> {
        let q = Query::new()
            .select(USER_SELECT)
            .eq("email", email.trim().to_lowercase());
        Ok(self.db.select_one(tables::USERS, &q).await?)
    }

    pub async fn find_role(&self, role_id: i64) -> Result<Role, UserError> {
        let q = Query::new().eq("id", role_id);
        self.db
            .select_one(tables::ROLES, &q)
            .await?
            .ok_or(UserError::RoleNotFound)
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Role, UserError> {
        let q = Query::new().eq("nombre_rol", name);
        self.db
            .select_one(tables::ROLES, &q)
            .await?
            .ok_or(UserError::RoleNotFound)
    }

    /// Permission codes granted through the user's role.
    pub async fn permission_codes(&self, role_id: i64) -> Result<Vec<String>, UserError> {
        let q = Query::new()
            .select("permiso:core_permiso(codigo)")
            .eq("rol_id", role_id);
        let rows: Vec<Value> = self.db.select(tables::ROLE_PERMISSIONS, &q).await?;

        Ok(rows
            .iter()
            .filter_map(|row| row["permiso"]["codigo"].as_str().map(str::to_string))
            .collect())
    }

    async fn ensure_email_free(&self, email: &str, except: Option<i64>) -> Result<(), UserError> {
        let mut q = Query::new().select("id").eq("email", email);
        if let Some(id) = except {
            q = q.neq("id", id);
        }
        if self.db.exists(tables::USERS, &q).await? {
            return Err(UserError::EmailTaken);
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserAccount, UserError> {
        let email = required(request.email, "email")?.to_lowercase();
        let nombre = required(request.nombre, "nombre")?;
        let apellido = required(request.apellido, "apellido")?;
        let password = request.password.unwrap_or_default();
        let role_id = request
            .id_rol
            .ok_or_else(|| UserError::Validation("El campo id_rol es obligatorio.".to_string()))?;

        validate_gender(request.genero.as_deref())?;
        if PasswordSecurityService::validate_length(&password).is_err() {
            return Err(UserError::InvalidPassword);
        }
        let hash = PasswordSecurityService::hash_password(&password)?;
        self.find_role(role_id).await?;
        self.ensure_email_free(&email, None).await?;

        let row = json!({
            "email": email,
            "password": hash,
            "nombre": nombre,
            "apellido": apellido,
            "telefono": request.telefono,
            "direccion": request.direccion,
            "fecha_nacimiento": request.fecha_nacimiento,
            "genero": request.genero,
            "activo": request.activo.unwrap_or(true),
            "is_active": true,
            "is_staff": false,
            "is_superuser": false,
            "id_rol_id": role_id,
        });

        let created: Value = self.db.insert(tables::USERS, row).await?;
        let user_id = created["id"]
            .as_i64()
            .ok_or_else(|| UserError::Database("Insert returned no id".to_string()))?;

        info!(user_id, "User created");
        self.get_user(user_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> Result<UserAccount, UserError> {
        self.get_user(user_id).await?;
        validate_gender(request.genero.as_deref())?;

        let mut changes = Map::new();
        if let Some(email) = request.email {
            let email = required(Some(email), "email")?.to_lowercase();
            self.ensure_email_free(&email, Some(user_id)).await?;
            changes.insert("email".into(), json!(email));
        }
        if let Some(nombre) = request.nombre {
            changes.insert("nombre".into(), json!(required(Some(nombre), "nombre")?));
        }
        if let Some(apellido) = request.apellido {
            changes.insert("apellido".into(), json!(required(Some(apellido), "apellido")?));
        }
        if let Some(telefono) = request.telefono {
            changes.insert("telefono".into(), json!(telefono));
        }
        if let Some(direccion) = request.direccion {
            changes.insert("direccion".into(), json!(direccion));
        }
        if let Some(fecha) = request.fecha_nacimiento {
            changes.insert("fecha_nacimiento".into(), json!(fecha));
        }
        if let Some(genero) = request.genero {
            changes.insert("genero".into(), json!(genero));
        }
        if let Some(activo) = request.activo {
            changes.insert("activo".into(), json!(activo));
        }
        if let Some(role_id) = request.id_rol {
            self.find_role(role_id).await?;
            changes.insert("id_rol_id".into(), json!(role_id));
        }
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            changes.insert(
                "password".into(),
                json!(PasswordSecurityService::hash_password(&password)?),
            );
        }

        self.apply_changes(user_id, changes).await
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: ProfileUpdateRequest,
    ) -> Result<UserAccount, UserError> {
        self.update_user(
            user_id,
            UpdateUserRequest {
                nombre: request.nombre,
                apellido: request.apellido,
                telefono: request.telefono,
                direccion: request.direccion,
                fecha_nacimiento: request.fecha_nacimiento,
                genero: request.genero,
                ..Default::default()
            },
        )
        .await
    }

    async fn apply_changes(
        &self,
        user_id: i64,
        changes: Map<String, Value>,
    ) -> Result<UserAccount, UserError> {
        if changes.is_empty() {
            return self.get_user(user_id).await;
        }
        debug!(user_id, fields = changes.len(), "Updating user");
        let q = Query::new().eq("id", user_id);
        let _: Vec<Value> = self
            .db
            .update(tables::USERS, &q, Value::Object(changes))
            .await?;
        self.get_user(user_id).await
    }

    pub async fn change_password(&self, user_id: i64, password: Option<&str>) -> Result<(), UserError> {
        let password = password.unwrap_or_default();
        if PasswordSecurityService::validate_length(password).is_err() {
            return Err(UserError::InvalidPassword);
        }
        self.get_user(user_id).await?;

        let hash = PasswordSecurityService::hash_password(password)?;
        let q = Query::new().eq("id", user_id);
        let _: Vec<Value> = self
            .db
            .update(tables::USERS, &q, json!({ "password": hash }))
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), UserError> {
        self.get_user(user_id).await?;
        self.db
            .delete(tables::USERS, &Query::new().eq("id", user_id))
            .await?;
        info!(user_id, "User deleted");
        Ok(())
    }

    pub async fn list_administrators(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Administrator>, UserError> {
        let q = Query::new()
            .select(&format!("usuario_id,usuario:core_usuario({})", USER_SELECT))
            .order("usuario_id", false)
            .paginate(limit, offset);
        Ok(self.db.select(tables::ADMINISTRATORS, &q).await?)
    }

    pub async fn get_administrator(&self, user_id: i64) -> Result<Administrator, UserError> {
        let q = Query::new()
            .select(&format!("usuario_id,usuario:core_usuario({})", USER_SELECT))
            .eq("usuario_id", user_id);
        self.db
            .select_one(tables::ADMINISTRATORS, &q)
            .await?
            .ok_or(UserError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unknown_gender_is_rejected() {
        assert!(validate_gender(Some("M")).is_ok());
        assert!(validate_gender(None).is_ok());
        assert_matches!(validate_gender(Some("X")), Err(UserError::Validation(_)));
    }

    #[test]
    fn blank_required_field_is_rejected() {
        assert_matches!(required(Some("  ".into()), "nombre"), Err(UserError::Validation(msg)) if msg.contains("nombre"));
        assert_eq!(required(Some(" Ana ".into()), "nombre").unwrap(), "Ana");
    }
}
