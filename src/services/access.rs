// src/services/access.rs
//
// Resolução de acesso: combina o papel global do usuário, as atribuições de
// loja do banco (user_store_access) e o documento de permissões em um único
// descritor. A precedência é definida AQUI e em nenhum outro lugar:
// atribuição no banco sempre vence a do arquivo, por usuário, sem mesclar.

use serde::{Deserialize, Serialize};

use crate::models::auth::{Claims, StoreRole, User};
use crate::models::inventory::Item;
use crate::models::tenancy::UserStoreAccess;
use crate::services::permissions::PermissionsDocument;

// Descritor de permissões embutido no token de sessão.
// `is_staff` é derivado e informativo; não funciona como gate próprio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub is_full_access: bool,
    pub is_staff: bool,
    pub full_access_store_ids: Vec<i32>,
    pub staff_store_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAccess {
    pub permissions: Permissions,
    pub store_ids: Vec<i32>,
    pub store_role: Option<StoreRole>,
}

// Função pura usada no login (para cunhar o token) e nos testes.
// Precedência, do mais específico para o mais genérico:
//   1. linhas do banco (dbStoreIds) definem storeIds e storeRole;
//   2. senão, managers[email] do arquivo (MANAGER);
//   3. senão, staff[email] do arquivo (STORE);
//   4. senão, nenhum escopo de loja.
pub fn resolve(user: &User, db_access: &[UserStoreAccess], doc: &PermissionsDocument) -> ResolvedAccess {
    let staff_store_ids = doc.staff_store_ids(&user.email);
    let manager_store_ids = doc.manager_store_ids(&user.email);

    let is_full_access =
        user.role.is_privileged() || doc.full_access_users.contains(&user.email);

    let db_store_ids: Vec<i32> = db_access.iter().map(|a| a.store_id).collect();
    let has_manager_row = db_access.iter().any(|a| a.store_role == StoreRole::Manager);

    let config_store_ids = if !manager_store_ids.is_empty() {
        manager_store_ids.clone()
    } else {
        staff_store_ids.clone()
    };

    let store_ids = if !db_store_ids.is_empty() {
        db_store_ids.clone()
    } else {
        config_store_ids
    };

    let store_role = if !db_store_ids.is_empty() {
        if has_manager_row {
            Some(StoreRole::Manager)
        } else {
            Some(StoreRole::Store)
        }
    } else if !manager_store_ids.is_empty() {
        Some(StoreRole::Manager)
    } else if !staff_store_ids.is_empty() {
        Some(StoreRole::Store)
    } else {
        None
    };

    ResolvedAccess {
        permissions: Permissions {
            is_full_access,
            is_staff: !staff_store_ids.is_empty(),
            full_access_store_ids: doc.full_access_store_ids.clone(),
            staff_store_ids,
        },
        store_ids,
        store_role,
    }
}

// ---
// Predicados de autorização
// ---
// Consumidos por todas as operações de mutação, para que nenhuma rota
// reinvente a checagem. O documento vem fresco do repositório a cada
// requisição: a lista de lojas de acesso total pode mudar depois do login.

pub fn assigned_to_store(claims: &Claims, store_id: i32) -> bool {
    claims.store_ids.contains(&store_id)
}

fn has_full_access(claims: &Claims, store_id: i32, doc: &PermissionsDocument) -> bool {
    claims.permissions.is_full_access
        || claims.role.is_privileged()
        || doc.full_access_store_ids.contains(&store_id)
}

pub fn can_create_item(claims: &Claims, store_id: i32, doc: &PermissionsDocument) -> bool {
    has_full_access(claims, store_id, doc)
        || (claims.store_role == Some(StoreRole::Manager) && assigned_to_store(claims, store_id))
}

// Edição completa (nome, categoria, requeridos). O caminho quantity-only do
// papel STORE é tratado à parte no InventoryService.
pub fn can_edit_item(claims: &Claims, item: &Item, doc: &PermissionsDocument) -> bool {
    has_full_access(claims, item.store_id, doc)
        || (claims.store_role == Some(StoreRole::Manager)
            && assigned_to_store(claims, item.store_id))
}

// Remoção só com acesso total; MANAGER não apaga.
pub fn can_delete_item(claims: &Claims, item: &Item, doc: &PermissionsDocument) -> bool {
    has_full_access(claims, item.store_id, doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use chrono::Utc;

    fn user(role: Role, email: &str) -> User {
        User {
            id: 1,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
            organization_id: Some(10),
            is_new_organization: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn db_row(store_id: i32, store_role: StoreRole) -> UserStoreAccess {
        UserStoreAccess {
            id: 0,
            user_id: 1,
            store_id,
            organization_id: Some(10),
            store_role,
            created_at: Utc::now(),
        }
    }

    fn claims_from(access: &ResolvedAccess, role: Role) -> Claims {
        Claims {
            user_id: 1,
            role,
            email: "x@example.com".to_string(),
            organization_id: Some(10),
            organization_name: None,
            is_new_organization: false,
            permissions: access.permissions.clone(),
            store_ids: access.store_ids.clone(),
            store_role: access.store_role,
            exp: 0,
            iat: 0,
        }
    }

    fn item_in_store(store_id: i32) -> Item {
        Item {
            id: 1,
            name: "Pão".to_string(),
            category: "Bakery".to_string(),
            quantity: 0,
            monday_required: 0,
            tuesday_required: 0,
            wednesday_required: 0,
            thursday_required: 0,
            friday_required: 0,
            saturday_required: 0,
            sunday_required: 0,
            store_id,
            organization_id: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn privileged_roles_are_full_access_regardless_of_document() {
        let doc = PermissionsDocument::default();
        for role in [Role::Admin, Role::Headoffice] {
            let resolved = resolve(&user(role, "boss@example.com"), &[], &doc);
            assert!(resolved.permissions.is_full_access);
            assert_eq!(resolved.store_role, None);
        }
    }

    #[test]
    fn full_access_by_email_allow_list() {
        let mut doc = PermissionsDocument::default();
        doc.full_access_users.push("vip@example.com".to_string());

        let resolved = resolve(&user(Role::Store, "vip@example.com"), &[], &doc);
        assert!(resolved.permissions.is_full_access);
    }

    #[test]
    fn db_rows_override_config_even_when_both_present() {
        let mut doc = PermissionsDocument::default();
        doc.staff.insert("a@example.com".to_string(), vec![7, 8]);
        doc.managers.insert("a@example.com".to_string(), vec![9]);

        let rows = vec![db_row(1, StoreRole::Store), db_row(2, StoreRole::Store)];
        let resolved = resolve(&user(Role::Store, "a@example.com"), &rows, &doc);

        assert_eq!(resolved.store_ids, vec![1, 2]);
        assert_eq!(resolved.store_role, Some(StoreRole::Store));
    }

    #[test]
    fn any_manager_db_row_promotes_store_role() {
        let rows = vec![db_row(1, StoreRole::Store), db_row(2, StoreRole::Manager)];
        let resolved = resolve(
            &user(Role::Store, "a@example.com"),
            &rows,
            &PermissionsDocument::default(),
        );
        assert_eq!(resolved.store_role, Some(StoreRole::Manager));
    }

    #[test]
    fn config_manager_entry_wins_over_staff_entry() {
        let mut doc = PermissionsDocument::default();
        doc.managers.insert("m@example.com".to_string(), vec![1, 2]);
        doc.staff.insert("m@example.com".to_string(), vec![3]);

        let resolved = resolve(&user(Role::Store, "m@example.com"), &[], &doc);
        assert_eq!(resolved.store_ids, vec![1, 2]);
        assert_eq!(resolved.store_role, Some(StoreRole::Manager));
    }

    #[test]
    fn staff_only_config_yields_store_role() {
        let mut doc = PermissionsDocument::default();
        doc.staff.insert("s@example.com".to_string(), vec![4]);

        let resolved = resolve(&user(Role::Store, "s@example.com"), &[], &doc);
        assert_eq!(resolved.store_ids, vec![4]);
        assert_eq!(resolved.store_role, Some(StoreRole::Store));
        assert!(resolved.permissions.is_staff);
        assert!(!resolved.permissions.is_full_access);
    }

    #[test]
    fn no_grants_resolves_to_empty_scope() {
        let resolved = resolve(
            &user(Role::Store, "ninguem@example.com"),
            &[],
            &PermissionsDocument::default(),
        );
        assert!(resolved.store_ids.is_empty());
        assert_eq!(resolved.store_role, None);
    }

    #[test]
    fn store_role_cannot_create_but_manager_can_inside_scope() {
        let mut doc = PermissionsDocument::default();
        doc.staff.insert("s@example.com".to_string(), vec![4]);
        let resolved = resolve(&user(Role::Store, "s@example.com"), &[], &doc);
        let claims = claims_from(&resolved, Role::Store);
        assert!(!can_create_item(&claims, 4, &doc));

        let mut doc = PermissionsDocument::default();
        doc.managers.insert("m@example.com".to_string(), vec![4]);
        let resolved = resolve(&user(Role::Store, "m@example.com"), &[], &doc);
        let claims = claims_from(&resolved, Role::Store);
        assert!(can_create_item(&claims, 4, &doc));
        assert!(!can_create_item(&claims, 5, &doc));
    }

    #[test]
    fn whitelisted_store_grants_create_and_delete() {
        let mut doc = PermissionsDocument::default();
        doc.full_access_store_ids.push(4);

        let resolved = resolve(&user(Role::Store, "s@example.com"), &[], &doc);
        let claims = claims_from(&resolved, Role::Store);
        assert!(can_create_item(&claims, 4, &doc));
        assert!(can_delete_item(&claims, &item_in_store(4), &doc));
        assert!(!can_delete_item(&claims, &item_in_store(5), &doc));
    }

    #[test]
    fn manager_edits_but_never_deletes() {
        let mut doc = PermissionsDocument::default();
        doc.managers.insert("m@example.com".to_string(), vec![4]);

        let resolved = resolve(&user(Role::Store, "m@example.com"), &[], &doc);
        let claims = claims_from(&resolved, Role::Store);
        assert!(can_edit_item(&claims, &item_in_store(4), &doc));
        assert!(!can_edit_item(&claims, &item_in_store(5), &doc));
        assert!(!can_delete_item(&claims, &item_in_store(4), &doc));
    }
}
