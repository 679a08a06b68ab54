use serde_json::{json, Map, Value};
use tracing::{info, instrument};

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};

use crate::models::{Permission, PermissionRequest, Role, RoleRequest, UserError};

pub struct RoleService {
    db: PostgrestClient,
}

/// Accepts only a JSON array of integer ids.
pub fn parse_permission_ids(raw: &Value) -> Result<Vec<i64>, UserError> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(UserError::InvalidPermissionList),
    };
    items
        .iter()
        .map(|item| item.as_i64().ok_or(UserError::InvalidPermissionList))
        .collect()
}

impl RoleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    // ==========================================================================
    // ROLES
    // ==========================================================================

    pub async fn list_roles(&self) -> Result<Vec<Role>, UserError> {
        let q = Query::new().order("id", false);
        Ok(self.db.select(tables::ROLES, &q).await?)
    }

    pub async fn get_role(&self, role_id: i64) -> Result<Role, UserError> {
        self.db
            .select_one(tables::ROLES, &Query::new().eq("id", role_id))
            .await?
            .ok_or(UserError::RoleNotFound)
    }

    async fn ensure_role_name_free(&self, name: &str, except: Option<i64>) -> Result<(), UserError> {
        let mut q = Query::new().select("id").eq("nombre_rol", name);
        if let Some(id) = except {
            q = q.neq("id", id);
        }
        if self.db.exists(tables::ROLES, &q).await? {
            return Err(UserError::Duplicate(
                "Ya existe un rol con este nombre.".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn create_role(&self, request: RoleRequest) -> Result<Role, UserError> {
        let name = request
            .nombre_rol
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| UserError::Validation("El campo nombre_rol es obligatorio.".to_string()))?;
        self.ensure_role_name_free(&name, None).await?;

        let role: Role = self
            .db
            .insert(
                tables::ROLES,
                json!({ "nombre_rol": name, "descripcion": request.descripcion }),
            )
            .await?;
        info!(role_id = role.id, "Role created");
        Ok(role)
    }

    pub async fn update_role(&self, role_id: i64, request: RoleRequest) -> Result<Role, UserError> {
        self.get_role(role_id).await?;

        let mut changes = Map::new();
        if let Some(name) = request.nombre_rol {
            self.ensure_role_name_free(&name, Some(role_id)).await?;
            changes.insert("nombre_rol".into(), json!(name));
        }
        if let Some(descripcion) = request.descripcion {
            changes.insert("descripcion".into(), json!(descripcion));
        }
        if changes.is_empty() {
            return self.get_role(role_id).await;
        }

        let rows: Vec<Role> = self
            .db
            .update(tables::ROLES, &Query::new().eq("id", role_id), Value::Object(changes))
            .await?;
        rows.into_iter().next().ok_or(UserError::RoleNotFound)
    }

    pub async fn delete_role(&self, role_id: i64) -> Result<(), UserError> {
        self.get_role(role_id).await?;
        self.db
            .delete(tables::ROLES, &Query::new().eq("id", role_id))
            .await?;
        info!(role_id, "Role deleted");
        Ok(())
    }

    pub async fn role_permissions(&self, role_id: i64) -> Result<Vec<Permission>, UserError> {
        self.get_role(role_id).await?;
        let q = Query::new()
            .select("permiso:core_permiso(*)")
            .eq("rol_id", role_id);
        let rows: Vec<Value> = self.db.select(tables::ROLE_PERMISSIONS, &q).await?;

        rows.into_iter()
            .map(|mut row| {
                serde_json::from_value(row["permiso"].take())
                    .map_err(|e| UserError::Database(e.to_string()))
            })
            .collect()
    }

    async fn granted_permission_ids(&self, role_id: i64) -> Result<Vec<i64>, UserError> {
        let q = Query::new().select("permiso_id").eq("rol_id", role_id);
        let rows: Vec<Value> = self.db.select(tables::ROLE_PERMISSIONS, &q).await?;
        Ok(rows.iter().filter_map(|row| row["permiso_id"].as_i64()).collect())
    }

    /// Replaces the role's permission set.
    #[instrument(skip(self, raw))]
    pub async fn set_role_permissions(&self, role_id: i64, raw: &Value) -> Result<(), UserError> {
        let mut ids = parse_permission_ids(raw)?;
        ids.sort_unstable();
        ids.dedup();
        self.get_role(role_id).await?;

        if !ids.is_empty() {
            let q = Query::new().select("id").is_in("id", &ids);
            let found: Vec<Value> = self.db.select(tables::PERMISSIONS, &q).await?;
            if found.len() != ids.len() {
                return Err(UserError::PermissionNotFound);
            }
        }

        // Grant before revoking so a failed write never leaves the role empty.
        let current = self.granted_permission_ids(role_id).await?;
        let added: Vec<Value> = ids
            .iter()
            .filter(|id| !current.contains(*id))
            .map(|id| json!({ "rol_id": role_id, "permiso_id": id }))
            .collect();
        let removed: Vec<i64> = current
            .iter()
            .copied()
            .filter(|id| !ids.contains(id))
            .collect();

        if !added.is_empty() {
            let _: Vec<Value> = self
                .db
                .insert_many(tables::ROLE_PERMISSIONS, Value::Array(added))
                .await?;
        }
        if !removed.is_empty() {
            let q = Query::new().eq("rol_id", role_id).is_in("permiso_id", &removed);
            self.db.delete(tables::ROLE_PERMISSIONS, &q).await?;
        }

        info!(role_id, permissions = ids.len(), "Role permissions replaced");
        Ok(())
    }

    // ==========================================================================
    // PERMISSIONS
    // ==========================================================================

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, UserError> {
        let q = Query::new().order("id", true);
        Ok(self.db.select(tables::PERMISSIONS, &q).await?)
    }

    pub async fn get_permission(&self, permission_id: i64) -> Result<Permission, UserError> {
        self.db
            .select_one(tables::PERMISSIONS, &Query::new().eq("id", permission_id))
            .await?
            .ok_or(UserError::PermissionNotFound)
    }

    async fn ensure_permission_free(
        &self,
        nombre: Option<&str>,
        codigo: Option<&str>,
        except: Option<i64>,
    ) -> Result<(), UserError> {
        for (column, value) in [("nombre", nombre), ("codigo", codigo)] {
            let Some(value) = value else { continue };
            let mut q = Query::new().select("id").eq(column, value);
            if let Some(id) = except {
                q = q.neq("id", id);
            }
            if self.db.exists(tables::PERMISSIONS, &q).await? {
                return Err(UserError::Duplicate(format!(
                    "Ya existe un permiso con este {}.",
                    column
                )));
            }
        }
        Ok(())
    }

    pub async fn create_permission(&self, request: PermissionRequest) -> Result<Permission, UserError> {
        let nombre = request
            .nombre
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| UserError::Validation("El campo nombre es obligatorio.".to_string()))?;
        let codigo = request
            .codigo
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| UserError::Validation("El campo codigo es obligatorio.".to_string()))?;
        self.ensure_permission_free(Some(&nombre), Some(&codigo), None)
            .await?;

        Ok(self
            .db
            .insert(
                tables::PERMISSIONS,
                json!({ "nombre": nombre, "codigo": codigo, "descripcion": request.descripcion }),
            )
            .await?)
    }

    pub async fn update_permission(
        &self,
        permission_id: i64,
        request: PermissionRequest,
    ) -> Result<Permission, UserError> {
        self.get_permission(permission_id).await?;
        self.ensure_permission_free(
            request.nombre.as_deref(),
            request.codigo.as_deref(),
            Some(permission_id),
        )
        .await?;

        let mut changes = Map::new();
        if let Some(nombre) = request.nombre {
            changes.insert("nombre".into(), json!(nombre));
        }
        if let Some(codigo) = request.codigo {
            changes.insert("codigo".into(), json!(codigo));
        }
        if let Some(descripcion) = request.descripcion {
            changes.insert("descripcion".into(), json!(descripcion));
        }
        if changes.is_empty() {
            return self.get_permission(permission_id).await;
        }

        let rows: Vec<Permission> = self
            .db
            .update(
                tables::PERMISSIONS,
                &Query::new().eq("id", permission_id),
                Value::Object(changes),
            )
            .await?;
        rows.into_iter().next().ok_or(UserError::PermissionNotFound)
    }

    pub async fn delete_permission(&self, permission_id: i64) -> Result<(), UserError> {
        self.get_permission(permission_id).await?;
        self.db
            .delete(tables::PERMISSIONS, &Query::new().eq("id", permission_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn permission_ids_must_be_a_list_of_integers() {
        assert_eq!(parse_permission_ids(&json!([1, 2, 3])).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_permission_ids(&Value::Null).unwrap(), Vec::<i64>::new());
        assert_matches!(
            parse_permission_ids(&json!("1,2")),
            Err(UserError::InvalidPermissionList)
        );
        assert_matches!(
            parse_permission_ids(&json!([1, "dos"])),
            Err(UserError::InvalidPermissionList)
        );
    }
}
