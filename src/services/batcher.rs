// src/services/batcher.rs
//
// Acumulador de atualizações de itens por (organização, loja). A primeira
// atualização abre uma janela fixa; as seguintes só substituem a entrada do
// item. Ao fim da janela sai um único e-mail de resumo para notifyEmails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::db::StoreRepository;
use crate::models::inventory::{DayEntry, Item};
use crate::services::mailer::EmailSender;
use crate::services::permissions::PermissionsRepository;

// (organizationId, storeId)
pub type BatchKey = (Option<i32>, i32);

#[derive(Debug, Clone)]
pub struct ItemUpdateEvent {
    pub item_id: Option<i32>,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub previous_quantity: Option<i32>,
    pub day_breakdown: Option<Vec<DayEntry>>,
}

impl ItemUpdateEvent {
    pub fn from_item(item: &Item, previous_quantity: Option<i32>, day_breakdown: Option<Vec<DayEntry>>) -> Self {
        Self {
            item_id: Some(item.id),
            name: item.name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            previous_quantity,
            day_breakdown,
        }
    }

    // Identidade dentro do lote: id do item, ou o nome quando não houver id
    fn key(&self) -> String {
        match self.item_id {
            Some(id) => id.to_string(),
            None => self.name.clone(),
        }
    }
}

// Entradas na ordem de primeira aparição; upsert substitui no lugar.
#[derive(Default)]
struct BatchEntry {
    items: Vec<(String, ItemUpdateEvent)>,
}

impl BatchEntry {
    fn upsert(&mut self, event: ItemUpdateEvent) {
        let key = event.key();
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = event,
            None => self.items.push((key, event)),
        }
    }
}

struct BatcherInner {
    enabled: bool,
    window: Duration,
    batches: Mutex<HashMap<BatchKey, BatchEntry>>,
    permissions: Arc<dyn PermissionsRepository>,
    mailer: Arc<dyn EmailSender>,
    // Só para resolver o nome da loja no assunto; None nos testes.
    store_repo: Option<StoreRepository>,
}

#[derive(Clone)]
pub struct UpdateBatcher {
    inner: Arc<BatcherInner>,
}

impl UpdateBatcher {
    pub fn new(
        enabled: bool,
        window: Duration,
        permissions: Arc<dyn PermissionsRepository>,
        mailer: Arc<dyn EmailSender>,
        store_repo: Option<StoreRepository>,
    ) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                enabled,
                window,
                batches: Mutex::new(HashMap::new()),
                permissions,
                mailer,
                store_repo,
            }),
        }
    }

    // Registra uma atualização. A primeira para a chave arma o timer da
    // janela; o timer NUNCA é rearmado por eventos seguintes.
    pub fn queue(&self, organization_id: Option<i32>, store_id: i32, event: ItemUpdateEvent) {
        if !self.inner.enabled {
            return;
        }
        let key: BatchKey = (organization_id, store_id);

        let is_new = {
            let mut batches = self.inner.batches.lock().expect("batcher mutex poisoned");
            let is_new = !batches.contains_key(&key);
            batches.entry(key).or_default().upsert(event);
            is_new
        };

        if is_new {
            let batcher = self.clone();
            let window = self.inner.window;
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                batcher.flush(key).await;
            });
        }
    }

    // Drena e envia o lote de uma chave. Visível para os testes dispararem
    // o flush sem esperar a janela real.
    pub async fn flush(&self, key: BatchKey) {
        let items: Vec<ItemUpdateEvent> = {
            let mut batches = self.inner.batches.lock().expect("batcher mutex poisoned");
            match batches.remove(&key) {
                Some(entry) => entry.items.into_iter().map(|(_, e)| e).collect(),
                None => return, // flush duplicado: no-op
            }
        };
        if items.is_empty() {
            return;
        }

        let recipients = self.inner.permissions.read().await.notify_emails;
        if recipients.is_empty() {
            return; // sem destinatários, descarta em silêncio
        }

        let (_, store_id) = key;
        let mut store_name = format!("Store {store_id}");
        if let Some(repo) = &self.inner.store_repo {
            if let Ok(Some(store)) = repo.find_by_id(store_id).await {
                store_name = store.name;
            }
        }

        let subject = format!(
            "StockIT: Items updated ({store_name}) — {} change{}",
            items.len(),
            if items.len() > 1 { "s" } else { "" }
        );
        let html = render_summary(&store_name, &items);

        // Melhor esforço, no máximo uma vez: falha é logada e não re-tentada.
        if let Err(e) = self.inner.mailer.send(&recipients, &subject, &html).await {
            tracing::warn!("Falha no envio do resumo de atualizações: {}", e);
        }
    }
}

pub fn format_day_breakdown(breakdown: &[DayEntry]) -> String {
    const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    breakdown
        .iter()
        .filter(|e| (0..7).contains(&e.day_idx))
        .map(|e| format!("{} {}", e.qty, DAYS[e.day_idx as usize]))
        .collect::<Vec<_>>()
        .join(", ")
}

// Resumo determinístico: bloco de texto copiável + tabela HTML, na ordem de
// primeira aparição dos itens.
fn render_summary(store_name: &str, items: &[ItemUpdateEvent]) -> String {
    let copy_block = items
        .iter()
        .map(|it| {
            let breakdown = it
                .day_breakdown
                .as_deref()
                .map(|b| format!(" ({})", format_day_breakdown(b)))
                .unwrap_or_default();
            format!("- {} — Qty: {}{}", it.name, it.quantity, breakdown)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let rows = items
        .iter()
        .map(|it| {
            let previous = it
                .previous_quantity
                .map(|q| q.to_string())
                .unwrap_or_else(|| "-".to_string());
            let breakdown = it
                .day_breakdown
                .as_deref()
                .map(format_day_breakdown)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "-".to_string());
            format!(
                r#"<tr>
              <td style="padding:8px;border:1px solid #ddd;">{}</td>
              <td style="padding:8px;border:1px solid #ddd;">{}</td>
              <td style="padding:8px;border:1px solid #ddd;">{}</td>
              <td style="padding:8px;border:1px solid #ddd;">{}</td>
              <td style="padding:8px;border:1px solid #ddd;">{}</td>
            </tr>"#,
                it.name, it.category, previous, it.quantity, breakdown
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<div style="font-family:Arial,sans-serif;">
      <h3>Items Update Summary</h3>
      <p><strong>Store:</strong> {store_name}</p>
      <div style="background:#fff8e1;border:1px dashed #e0c200;padding:12px;border-radius:4px;margin:15px 0;">
        <div style="font-weight:bold;margin-bottom:8px;">Copy &amp; Paste Summary:</div>
        <pre style="white-space:pre-wrap;font-family:Consolas, 'Courier New', monospace;font-size:13px;line-height:1.5;margin:0;">{copy_block}</pre>
      </div>
      <table style="border-collapse:collapse;width:100%;">
        <thead>
          <tr style="background:#f2f2f2;">
            <th style="padding:8px;border:1px solid #ddd;text-align:left;">Item</th>
            <th style="padding:8px;border:1px solid #ddd;text-align:left;">Category</th>
            <th style="padding:8px;border:1px solid #ddd;text-align:left;">Previous Qty</th>
            <th style="padding:8px;border:1px solid #ddd;text-align:left;">Quantity</th>
            <th style="padding:8px;border:1px solid #ddd;text-align:left;">Day Breakdown</th>
          </tr>
        </thead>
        <tbody>
          {rows}
        </tbody>
      </table>
      <p style="color:#555;margin-top:12px;">Tip: Copy the summary block above to share quickly.</p>
    </div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::AppError;
    use crate::services::permissions::PermissionsDocument;
    use async_trait::async_trait;

    struct RecordingMailer {
        sent: Mutex<Vec<(Vec<String>, String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self { sent: Mutex::new(Vec::new()) })
        }

        fn sent(&self) -> Vec<(Vec<String>, String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingMailer {
        async fn send(
            &self,
            recipients: &[String],
            subject: &str,
            html_body: &str,
        ) -> Result<(), AppError> {
            self.sent.lock().unwrap().push((
                recipients.to_vec(),
                subject.to_string(),
                html_body.to_string(),
            ));
            Ok(())
        }
    }

    struct FixedPermissions(PermissionsDocument);

    #[async_trait]
    impl PermissionsRepository for FixedPermissions {
        async fn read(&self) -> PermissionsDocument {
            self.0.clone()
        }

        async fn write(&self, _doc: &PermissionsDocument) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn event(id: i32, name: &str, quantity: i32) -> ItemUpdateEvent {
        ItemUpdateEvent {
            item_id: Some(id),
            name: name.to_string(),
            category: "Other".to_string(),
            quantity,
            previous_quantity: None,
            day_breakdown: None,
        }
    }

    fn batcher_with(
        notify: Vec<String>,
        mailer: Arc<RecordingMailer>,
    ) -> UpdateBatcher {
        let mut doc = PermissionsDocument::default();
        doc.notify_emails = notify;
        UpdateBatcher::new(
            true,
            Duration::from_secs(3600), // janela longa: os testes dão flush manual
            Arc::new(FixedPermissions(doc)),
            mailer,
            None,
        )
    }

    #[tokio::test]
    async fn two_updates_same_key_produce_one_email_with_latest_quantities() {
        let mailer = RecordingMailer::new();
        let batcher = batcher_with(vec!["ops@example.com".into()], mailer.clone());

        batcher.queue(Some(1), 2, event(10, "Milk", 5));
        batcher.queue(Some(1), 2, event(11, "Bread", 3));
        batcher.queue(Some(1), 2, event(10, "Milk", 8)); // última escrita vence
        batcher.flush((Some(1), 2)).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let (recipients, subject, html) = &sent[0];
        assert_eq!(recipients, &vec!["ops@example.com".to_string()]);
        assert!(subject.contains("2 changes"));
        assert!(html.contains("Milk — Qty: 8"));
        assert!(html.contains("Bread — Qty: 3"));
        assert!(!html.contains("Qty: 5"));
        // Ordem de primeira aparição: Milk antes de Bread
        assert!(html.find("Milk").unwrap() < html.find("Bread").unwrap());
    }

    #[tokio::test]
    async fn empty_recipient_list_drops_batch_silently() {
        let mailer = RecordingMailer::new();
        let batcher = batcher_with(vec![], mailer.clone());

        batcher.queue(Some(1), 2, event(10, "Milk", 5));
        batcher.flush((Some(1), 2)).await;

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn flush_is_noop_after_batch_already_flushed() {
        let mailer = RecordingMailer::new();
        let batcher = batcher_with(vec!["ops@example.com".into()], mailer.clone());

        batcher.queue(Some(1), 2, event(10, "Milk", 5));
        batcher.flush((Some(1), 2)).await;
        batcher.flush((Some(1), 2)).await;

        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn new_queue_after_flush_starts_fresh_cycle() {
        let mailer = RecordingMailer::new();
        let batcher = batcher_with(vec!["ops@example.com".into()], mailer.clone());

        batcher.queue(Some(1), 2, event(10, "Milk", 5));
        batcher.flush((Some(1), 2)).await;
        batcher.queue(Some(1), 2, event(10, "Milk", 9));
        batcher.flush((Some(1), 2)).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].2.contains("Qty: 9"));
    }

    #[tokio::test]
    async fn separate_keys_flush_independently() {
        let mailer = RecordingMailer::new();
        let batcher = batcher_with(vec!["ops@example.com".into()], mailer.clone());

        batcher.queue(Some(1), 2, event(10, "Milk", 5));
        batcher.queue(Some(1), 3, event(20, "Eggs", 12));
        batcher.flush((Some(1), 2)).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].2.contains("Milk"));
        assert!(!sent[0].2.contains("Eggs"));
    }

    #[tokio::test]
    async fn disabled_batcher_never_sends() {
        let mailer = RecordingMailer::new();
        let mut doc = PermissionsDocument::default();
        doc.notify_emails = vec!["ops@example.com".into()];
        let batcher = UpdateBatcher::new(
            false,
            Duration::from_millis(1),
            Arc::new(FixedPermissions(doc)),
            mailer.clone(),
            None,
        );

        batcher.queue(Some(1), 2, event(10, "Milk", 5));
        batcher.flush((Some(1), 2)).await;
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn summary_shows_previous_quantity_when_known() {
        let mailer = RecordingMailer::new();
        let batcher = batcher_with(vec!["ops@example.com".into()], mailer.clone());

        let mut update = event(10, "Milk", 8);
        update.previous_quantity = Some(3);
        batcher.queue(Some(1), 2, update);
        batcher.queue(Some(1), 2, event(11, "Bread", 4)); // sem valor anterior
        batcher.flush((Some(1), 2)).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let html = &sent[0].2;
        assert!(html.contains("Previous Qty"));
        assert!(html.contains(">3</td>"));
        assert!(html.contains(">-</td>"));
    }

    #[test]
    fn day_breakdown_formats_with_weekday_labels() {
        let breakdown = vec![
            DayEntry { day_idx: 1, qty: 5 },
            DayEntry { day_idx: 6, qty: 2 },
        ];
        assert_eq!(format_day_breakdown(&breakdown), "5 Mon, 2 Sat");
    }
}
