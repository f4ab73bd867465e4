// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{OrganizationRepository, StoreAccessRepository, UserRepository},
    models::auth::{
        AcceptInvitePayload, AuthResponse, Claims, InviteClaims, RegisterUserPayload, Role,
        StoreRole, User, UserView,
    },
    services::access::{self, ResolvedAccess},
    services::permissions::PermissionsRepository,
};

// ---
// TokenService: emissão e verificação de tokens assinados
// ---
// Sessão: claims completas do AccessResolver, validade configurável (1 dia).
// Convite: payload provisório com `type = "invite"`, validade de 7 dias.
#[derive(Clone)]
pub struct TokenService {
    jwt_secret: String,
    session_ttl: Duration,
}

pub const INVITE_TOKEN_TYPE: &str = "invite";

impl TokenService {
    pub fn new(jwt_secret: String, session_ttl: Duration) -> Self {
        Self { jwt_secret, session_ttl }
    }

    pub fn issue_session_token(
        &self,
        user: &User,
        organization_name: Option<String>,
        access: &ResolvedAccess,
    ) -> Result<String, AppError> {
        self.issue_session_token_at(user, organization_name, access, Utc::now())
    }

    // Recebe `now` explícito para que a expiração seja testável sem esperar.
    pub fn issue_session_token_at(
        &self,
        user: &User,
        organization_name: Option<String>,
        access: &ResolvedAccess,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let expires_at = now + self.session_ttl;

        let claims = Claims {
            user_id: user.id,
            role: user.role,
            email: user.email.clone(),
            organization_id: user.organization_id,
            organization_name,
            is_new_organization: user.is_new_organization,
            permissions: access.permissions.clone(),
            store_ids: access.store_ids.clone(),
            store_role: access.store_role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub fn verify_session_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub fn issue_invite_token(
        &self,
        email: &str,
        role: Role,
        store_role: Option<StoreRole>,
        store_ids: Vec<i32>,
        organization_id: i32,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = InviteClaims {
            email: email.to_string(),
            role,
            store_role,
            store_ids,
            organization_id,
            token_type: INVITE_TOKEN_TYPE.to_string(),
            exp: (now + Duration::days(7)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub fn verify_invite_token(&self, token: &str) -> Result<InviteClaims, AppError> {
        let token_data = decode::<InviteClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        if token_data.claims.token_type != INVITE_TOKEN_TYPE {
            return Err(AppError::WrongTokenType);
        }
        Ok(token_data.claims)
    }
}

// ---
// AuthService: login, registro e aceitação de convites
// ---
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    store_access_repo: StoreAccessRepository,
    permissions: Arc<dyn PermissionsRepository>,
    tokens: TokenService,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        store_access_repo: StoreAccessRepository,
        permissions: Arc<dyn PermissionsRepository>,
        tokens: TokenService,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, org_repo, store_access_repo, permissions, tokens, pool }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    // Resolve o acesso do usuário: linhas do banco + documento de permissões.
    // Usado no login e na aceitação de convite (a precedência vive em access::resolve).
    pub async fn resolve_access(&self, user: &User) -> Result<ResolvedAccess, AppError> {
        let db_access = self.store_access_repo.list_for_user(user.id).await?;
        let doc = self.permissions.read().await;
        Ok(access::resolve(user, &db_access, &doc))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Executa a verificação de senha em uma thread separada
        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.build_session(&user).await
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        if self.user_repo.find_by_email(&payload.email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = hash_password(payload.password.clone()).await?;
        let role = payload.role.unwrap_or(Role::Store);

        // Criação da organização e do usuário na mesma transação
        let mut tx = self.pool.begin().await?;

        let organization_id = if payload.is_new_organization {
            let name = payload
                .organization_name
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("organizationName é obrigatório.".into()))?;
            let org = self
                .org_repo
                .create(&mut *tx, name, Some(&payload.email), "OTHER", None, None, "Australia/Canberra")
                .await?;
            Some(org.id)
        } else if let Some(existing_id) = payload.existing_organization_id {
            let org = self
                .org_repo
                .find_by_id(existing_id)
                .await?
                .ok_or(AppError::OrganizationNotFound)?;
            Some(org.id)
        } else {
            None
        };

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                &payload.email,
                &password_hash,
                role,
                organization_id,
                payload.is_new_organization,
            )
            .await?;

        tx.commit().await?;

        self.build_session(&user).await
    }

    // Aceita um convite: cria o usuário se não existir (ou troca a senha) e
    // substitui as atribuições de loja das lojas do convite (delete+recreate).
    pub async fn accept_invite(&self, payload: &AcceptInvitePayload) -> Result<AuthResponse, AppError> {
        let invite = self.tokens.verify_invite_token(&payload.token)?;
        let email = invite.email.to_lowercase();

        let password_hash = hash_password(payload.password.clone()).await?;
        let existing = self.user_repo.find_by_email(&email).await?;

        let mut tx = self.pool.begin().await?;

        let user = match existing {
            Some(user) => {
                self.user_repo.update_password(&mut *tx, user.id, &password_hash).await?;
                user
            }
            None => {
                self.user_repo
                    .create_user(
                        &mut *tx,
                        &email,
                        &password_hash,
                        invite.role,
                        Some(invite.organization_id),
                        false,
                    )
                    .await?
            }
        };

        if invite.role == Role::Store && !invite.store_ids.is_empty() {
            let store_role = match invite.store_role {
                Some(StoreRole::Manager) => StoreRole::Manager,
                _ => StoreRole::Store,
            };
            self.store_access_repo
                .replace_for_stores(
                    &mut tx,
                    user.id,
                    &invite.store_ids,
                    Some(invite.organization_id),
                    store_role,
                )
                .await?;
        }

        tx.commit().await?;

        self.build_session(&user).await
    }

    // Monta o token de sessão e a visão do usuário a partir do acesso resolvido
    async fn build_session(&self, user: &User) -> Result<AuthResponse, AppError> {
        let organization_name = match user.organization_id {
            Some(org_id) => self.org_repo.find_by_id(org_id).await?.map(|o| o.name),
            None => None,
        };

        let access = self.resolve_access(user).await?;
        let token = self
            .tokens
            .issue_session_token(user, organization_name.clone(), &access)?;

        Ok(AuthResponse {
            token,
            user: UserView {
                id: user.id,
                email: user.email.clone(),
                role: user.role,
                organization_id: user.organization_id,
                organization_name,
                is_new_organization: user.is_new_organization,
                permissions: access.permissions,
                store_ids: access.store_ids,
                store_role: access.store_role,
            },
            success: true,
        })
    }
}

async fn hash_password(password: String) -> Result<String, AppError> {
    // O hashing do bcrypt é caro; roda fora do executor async
    tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
        .map_err(AppError::BcryptError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::access::Permissions;
    use chrono::Utc;

    fn token_service() -> TokenService {
        TokenService::new("segredo-de-teste".to_string(), Duration::days(1))
    }

    fn sample_user() -> User {
        User {
            id: 42,
            email: "gerente@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Store,
            organization_id: Some(7),
            is_new_organization: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_access() -> ResolvedAccess {
        ResolvedAccess {
            permissions: Permissions {
                is_full_access: false,
                is_staff: true,
                full_access_store_ids: vec![9],
                staff_store_ids: vec![1, 2],
            },
            store_ids: vec![1, 2],
            store_role: Some(StoreRole::Manager),
        }
    }

    #[test]
    fn session_token_round_trips_all_claims() {
        let tokens = token_service();
        let user = sample_user();
        let access = sample_access();

        let token = tokens
            .issue_session_token(&user, Some("Padaria Central".to_string()), &access)
            .unwrap();
        let claims = tokens.verify_session_token(&token).unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Store);
        assert_eq!(claims.email, "gerente@example.com");
        assert_eq!(claims.organization_id, Some(7));
        assert_eq!(claims.organization_name.as_deref(), Some("Padaria Central"));
        assert_eq!(claims.permissions, access.permissions);
        assert_eq!(claims.store_ids, vec![1, 2]);
        assert_eq!(claims.store_role, Some(StoreRole::Manager));
    }

    #[test]
    fn expired_session_token_is_rejected() {
        let tokens = token_service();
        let user = sample_user();
        let access = sample_access();

        // Emitido dois dias atrás com validade de um dia
        let issued_at = Utc::now() - Duration::days(2);
        let token = tokens
            .issue_session_token_at(&user, None, &access, issued_at)
            .unwrap();

        assert!(matches!(
            tokens.verify_session_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = token_service();
        let other = TokenService::new("outro-segredo".to_string(), Duration::days(1));
        let token = other
            .issue_session_token(&sample_user(), None, &sample_access())
            .unwrap();

        assert!(matches!(
            tokens.verify_session_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn invite_token_round_trips_payload() {
        let tokens = token_service();
        let token = tokens
            .issue_invite_token(
                "novo@example.com",
                Role::Store,
                Some(StoreRole::Manager),
                vec![3, 4],
                7,
            )
            .unwrap();

        let invite = tokens.verify_invite_token(&token).unwrap();
        assert_eq!(invite.email, "novo@example.com");
        assert_eq!(invite.role, Role::Store);
        assert_eq!(invite.store_role, Some(StoreRole::Manager));
        assert_eq!(invite.store_ids, vec![3, 4]);
        assert_eq!(invite.organization_id, 7);
        assert_eq!(invite.token_type, INVITE_TOKEN_TYPE);
    }

    #[test]
    fn session_token_is_not_accepted_as_invite() {
        let tokens = token_service();
        let token = tokens
            .issue_session_token(&sample_user(), None, &sample_access())
            .unwrap();

        // Claims de sessão não carregam `type`, então a decodificação falha
        assert!(tokens.verify_invite_token(&token).is_err());
    }

    #[test]
    fn invite_token_with_wrong_type_tag_is_rejected() {
        let tokens = token_service();
        let now = Utc::now();
        let claims = InviteClaims {
            email: "x@example.com".to_string(),
            role: Role::Store,
            store_role: None,
            store_ids: vec![],
            organization_id: 1,
            token_type: "password-reset".to_string(),
            exp: (now + Duration::days(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("segredo-de-teste".as_ref()),
        )
        .unwrap();

        assert!(matches!(
            tokens.verify_invite_token(&token),
            Err(AppError::WrongTokenType)
        ));
    }
}
