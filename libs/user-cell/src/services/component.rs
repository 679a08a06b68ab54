use std::collections::BTreeMap;

use tracing::debug;

use shared_config::AppConfig;
use shared_database::{tables, PostgrestClient, Query};
use shared_models::auth::User;

use crate::models::{GrantedComponent, PermissionComponent, UiComponent, UserError};

const COMPONENT_SELECT: &str = "*,tipo_componente:core_tipocomponente(*)";

pub struct ComponentService {
    db: PostgrestClient,
}

/// Collapses grants per component, keeping the broadest action, ordered by `orden`.
pub fn merge_grants(grants: Vec<PermissionComponent>) -> Vec<GrantedComponent> {
    let mut merged: BTreeMap<i64, GrantedComponent> = BTreeMap::new();
    for grant in grants.into_iter().filter(|g| g.componente.activo) {
        merged
            .entry(grant.componente.id)
            .and_modify(|existing| {
                existing.accion_permitida = existing.accion_permitida.broadest(grant.accion_permitida)
            })
            .or_insert(GrantedComponent {
                componente: grant.componente,
                accion_permitida: grant.accion_permitida,
            });
    }

    let mut components: Vec<GrantedComponent> = merged.into_values().collect();
    components.sort_by_key(|c| (c.componente.orden, c.componente.id));
    components
}

impl ComponentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_active(&self) -> Result<Vec<UiComponent>, UserError> {
        let q = Query::new()
            .select(COMPONENT_SELECT)
            .eq("activo", true)
            .order("orden", true);
        Ok(self.db.select(tables::UI_COMPONENTS, &q).await?)
    }

    /// Components reachable through the caller's permission codes.
    pub async fn components_for(&self, user: &User) -> Result<Vec<GrantedComponent>, UserError> {
        if user.permissions.is_empty() {
            return Ok(Vec::new());
        }

        let codes: Vec<&str> = user.permissions.iter().map(String::as_str).collect();
        let q = Query::new()
            .select(&format!(
                "permiso_id,accion_permitida,permiso:core_permiso!inner(codigo),componente:core_componenteui({})",
                COMPONENT_SELECT
            ))
            .is_in("permiso.codigo", &codes);
        let grants: Vec<PermissionComponent> = self.db.select(tables::PERMISSION_COMPONENTS, &q).await?;

        debug!(user_id = user.id, grants = grants.len(), "Resolved component grants");
        Ok(merge_grants(grants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComponentAction;

    fn component(id: i64, orden: i32, activo: bool) -> UiComponent {
        UiComponent {
            id,
            codigo_componente: format!("comp_{}", id),
            nombre_componente: format!("Componente {}", id),
            modulo: None,
            ruta: None,
            icono: None,
            orden,
            activo,
            tipo_componente: None,
        }
    }

    fn grant(id: i64, orden: i32, action: ComponentAction) -> PermissionComponent {
        PermissionComponent {
            permiso_id: 1,
            accion_permitida: action,
            componente: component(id, orden, true),
        }
    }

    #[test]
    fn overlapping_grants_keep_the_broadest_action() {
        let merged = merge_grants(vec![
            grant(2, 5, ComponentAction::Ver),
            grant(1, 1, ComponentAction::Ver),
            grant(2, 5, ComponentAction::Todos),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].componente.id, 1);
        assert_eq!(merged[1].accion_permitida, ComponentAction::Todos);
    }

    #[test]
    fn inactive_components_are_dropped() {
        let inactive = PermissionComponent {
            permiso_id: 1,
            accion_permitida: ComponentAction::Ver,
            componente: component(9, 1, false),
        };
        assert!(merge_grants(vec![inactive]).is_empty());
    }
}
