// src/services/permissions.rs
//
// Documento de permissões editável pelo admin, persistido como JSON.
// É a fonte "legada" de escopo de loja; as linhas de user_store_access
// no banco têm precedência por usuário (veja services::access).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionsDocument {
    pub full_access_store_ids: Vec<i32>,
    pub full_access_users: Vec<String>,
    pub notify_emails: Vec<String>,
    pub staff: HashMap<String, Vec<i32>>,
    pub managers: HashMap<String, Vec<i32>>,
}

impl PermissionsDocument {
    pub fn staff_store_ids(&self, email: &str) -> Vec<i32> {
        self.staff.get(email).cloned().unwrap_or_default()
    }

    pub fn manager_store_ids(&self, email: &str) -> Vec<i32> {
        self.managers.get(email).cloned().unwrap_or_default()
    }
}

// Contrato de leitura/escrita do documento. Injetado como trait para que
// o armazenamento (arquivo, KV, tabela) seja trocável e testável.
#[async_trait]
pub trait PermissionsRepository: Send + Sync {
    // Nunca falha: arquivo ausente ou corrompido degrada para o documento vazio.
    async fn read(&self) -> PermissionsDocument;

    // Sobrescreve o documento inteiro. Escritores concorrentes podem se
    // atropelar (last-writer-wins); limitação documentada, não corrigida aqui.
    async fn write(&self, doc: &PermissionsDocument) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct FilePermissionsRepository {
    path: PathBuf,
}

impl FilePermissionsRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl PermissionsRepository for FilePermissionsRepository {
    async fn read(&self) -> PermissionsDocument {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Arquivo de permissões corrompido ({}); usando padrão.", e);
                PermissionsDocument::default()
            }),
            Err(_) => PermissionsDocument::default(),
        }
    }

    async fn write(&self, doc: &PermissionsDocument) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(doc)
            .map_err(|e| anyhow::anyhow!("Falha ao serializar permissões: {e}"))?;

        // Escreve em um temporário e renomeia por cima, para que um leitor
        // concorrente nunca observe um arquivo pela metade.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao escrever permissões: {e}"))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao substituir o arquivo de permissões: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_default_document() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePermissionsRepository::new(dir.path().join("nao-existe.json"));

        let doc = repo.read().await;
        assert_eq!(doc, PermissionsDocument::default());
        assert!(doc.full_access_store_ids.is_empty());
        assert!(doc.staff.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_yields_default_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        std::fs::write(&path, "{ isso nao é json").unwrap();

        let repo = FilePermissionsRepository::new(&path);
        assert_eq!(repo.read().await, PermissionsDocument::default());
    }

    #[tokio::test]
    async fn partial_document_defaults_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        std::fs::write(&path, r#"{ "fullAccessStoreIds": [3, 7] }"#).unwrap();

        let repo = FilePermissionsRepository::new(&path);
        let doc = repo.read().await;
        assert_eq!(doc.full_access_store_ids, vec![3, 7]);
        assert!(doc.notify_emails.is_empty());
        assert!(doc.managers.is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePermissionsRepository::new(dir.path().join("permissions.json"));

        let mut doc = PermissionsDocument::default();
        doc.full_access_store_ids = vec![1];
        doc.notify_emails = vec!["ops@example.com".into()];
        doc.staff.insert("a@example.com".into(), vec![2, 5]);
        doc.managers.insert("m@example.com".into(), vec![5]);

        repo.write(&doc).await.unwrap();
        assert_eq!(repo.read().await, doc);
    }
}
