// src/handlers/history.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{Claims, Role},
};

// Escopo da listagem de histórico derivado das claims.
#[derive(Debug, PartialEq)]
enum HistoryScope {
    // Usuário com escopo de loja e nenhuma atribuição: devolve [] sem consultar
    Empty,
    // Usuário com escopo de loja: restringe às lojas atribuídas
    Stores(Vec<i32>),
    // Demais usuários: a organização inteira
    Organization,
}

fn history_scope(claims: &Claims) -> HistoryScope {
    let store_scoped = claims.role == Role::Store || claims.store_role.is_some();
    if !store_scoped {
        return HistoryScope::Organization;
    }
    if claims.store_ids.is_empty() {
        return HistoryScope::Empty;
    }
    HistoryScope::Stores(claims.store_ids.clone())
}

// Histórico completo (mais recente primeiro). Sempre filtrado pela
// organização das claims; usuários com escopo de loja são restritos ainda
// às lojas atribuídas.
pub async fn get_full_history(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let history = match history_scope(&claims) {
        HistoryScope::Empty => Vec::new(),
        HistoryScope::Stores(store_ids) => {
            app_state
                .history_repo
                .list_full(claims.organization_id, Some(store_ids.as_slice()))
                .await?
        }
        HistoryScope::Organization => {
            app_state
                .history_repo
                .list_full(claims.organization_id, None)
                .await?
        }
    };
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::StoreRole;
    use crate::services::access::Permissions;

    fn claims(role: Role, store_role: Option<StoreRole>, store_ids: Vec<i32>) -> Claims {
        Claims {
            user_id: 1,
            role,
            email: "x@example.com".to_string(),
            organization_id: Some(10),
            organization_name: None,
            is_new_organization: false,
            permissions: Permissions {
                is_full_access: role.is_privileged(),
                is_staff: false,
                full_access_store_ids: vec![],
                staff_store_ids: vec![],
            },
            store_ids,
            store_role,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn privileged_user_gets_whole_organization_scope() {
        let c = claims(Role::Admin, None, vec![]);
        assert_eq!(history_scope(&c), HistoryScope::Organization);
    }

    #[test]
    fn store_scoped_user_is_restricted_to_assigned_stores() {
        let c = claims(Role::Store, Some(StoreRole::Store), vec![1, 2]);
        assert_eq!(history_scope(&c), HistoryScope::Stores(vec![1, 2]));
    }

    #[test]
    fn store_scoped_user_without_stores_gets_empty_scope() {
        let c = claims(Role::Store, Some(StoreRole::Store), vec![]);
        assert_eq!(history_scope(&c), HistoryScope::Empty);

        // Papel STORE sem storeRole resolvido também conta como escopo de loja
        let c = claims(Role::Store, None, vec![]);
        assert_eq!(history_scope(&c), HistoryScope::Empty);
    }
}
