use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Categoria '{0}' já existe")]
    CategoryAlreadyExists(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    // Sem credencial (credencial ausente) -> 401
    #[error("Acesso negado: nenhum token fornecido")]
    Unauthorized,

    // Credencial presente mas inválida/expirada -> 403 (assimetria intencional com Unauthorized)
    #[error("Token inválido ou expirado")]
    InvalidToken,

    #[error("Permissões insuficientes: {0}")]
    Forbidden(String),

    #[error("Tipo de token inválido")]
    WrongTokenType,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Item não encontrado")]
    ItemNotFound,

    #[error("Loja não encontrada")]
    StoreNotFound,

    #[error("Organização não encontrada")]
    OrganizationNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Usuário não está associado a uma organização")]
    MissingOrganization,

    // Falhas de validação da repartição por dia
    #[error("dayBreakdown inválido: {0}")]
    InvalidBreakdown(String),

    #[error("Repartição excede o requerido para dayIdx {day_idx}: {qty} > {cap}")]
    BreakdownExceedsRequired { day_idx: i32, qty: i32, cap: i32 },

    #[error("O total da repartição por dia deve ser igual à quantidade")]
    BreakdownMismatch,

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::CategoryAlreadyExists(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::CategoryNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }

            // 401 é reservado para "nenhum token"; token presente mas ruim vira 403.
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Acesso negado. Nenhum token fornecido.".to_string(),
            ),
            AppError::InvalidToken => {
                (StatusCode::FORBIDDEN, "Token inválido.".to_string())
            }
            AppError::Forbidden(ref msg) => {
                (StatusCode::FORBIDDEN, format!("Proibido: {msg}"))
            }
            AppError::WrongTokenType => {
                (StatusCode::BAD_REQUEST, "Tipo de token inválido.".to_string())
            }

            AppError::UserNotFound
            | AppError::ItemNotFound
            | AppError::StoreNotFound
            | AppError::OrganizationNotFound => (StatusCode::NOT_FOUND, self.to_string()),

            AppError::MissingOrganization => (StatusCode::BAD_REQUEST, self.to_string()),

            AppError::InvalidBreakdown(_)
            | AppError::BreakdownExceedsRequired { .. }
            | AppError::BreakdownMismatch
            | AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
