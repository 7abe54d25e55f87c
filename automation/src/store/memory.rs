// In-Memory Stores - Injectable replacements for a database-backed deployment

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shutterflow_shared::{Client, Contract, Gallery, Invoice, Shoot};
use tokio::sync::RwLock;

use super::{
    EntityStore, NewWorkflow, StoreError, TimeCandidate, WorkflowRecord, WorkflowStore,
    WorkflowUpdate,
};
use crate::workflows::triggers::TimeReference;

#[derive(Debug, Default)]
struct WorkflowsInner {
    workflows: HashMap<i64, WorkflowRecord>,
    next_id: i64,
}

/// Workflow definitions held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    inner: Arc<RwLock<WorkflowsInner>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<WorkflowRecord> = inner.workflows.values().cloned().collect();
        records.sort_by_key(|w| w.id);
        Ok(records)
    }

    async fn get(&self, id: i64) -> Result<Option<WorkflowRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.workflows.get(&id).cloned())
    }

    async fn active_workflows(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<WorkflowRecord> = inner
            .workflows
            .values()
            .filter(|w| w.is_active)
            .cloned()
            .collect();
        records.sort_by_key(|w| w.id);
        Ok(records)
    }

    async fn create(&self, workflow: NewWorkflow) -> Result<WorkflowRecord, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let record = WorkflowRecord {
            id: inner.next_id,
            name: workflow.name,
            description: workflow.description,
            is_active: workflow.is_active,
            steps: workflow.steps,
            created_at: now,
            updated_at: now,
        };
        inner.workflows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, changes: WorkflowUpdate) -> Result<WorkflowRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .workflows
            .get_mut(&id)
            .ok_or(StoreError::WorkflowNotFound(id))?;

        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(description) = changes.description {
            record.description = Some(description);
        }
        if let Some(is_active) = changes.is_active {
            record.is_active = is_active;
        }
        if let Some(steps) = changes.steps {
            record.steps = steps;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.workflows.remove(&id).is_some())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<WorkflowRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .workflows
            .get_mut(&id)
            .ok_or(StoreError::WorkflowNotFound(id))?;
        record.is_active = active;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

#[derive(Debug, Default)]
struct DirectoryInner {
    clients: HashMap<i64, Client>,
    shoots: Vec<Shoot>,
    invoices: Vec<Invoice>,
    contracts: Vec<Contract>,
    galleries: Vec<Gallery>,
}

/// Studio records held in process memory, joined into snapshots for the
/// time-trigger scan
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    inner: Arc<RwLock<DirectoryInner>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_client(&self, client: Client) {
        let mut inner = self.inner.write().await;
        inner.clients.insert(client.id, client);
    }

    pub async fn add_shoot(&self, shoot: Shoot) {
        let mut inner = self.inner.write().await;
        inner.shoots.push(shoot);
    }

    pub async fn add_invoice(&self, invoice: Invoice) {
        let mut inner = self.inner.write().await;
        inner.invoices.push(invoice);
    }

    pub async fn add_contract(&self, contract: Contract) {
        let mut inner = self.inner.write().await;
        inner.contracts.push(contract);
    }

    pub async fn add_gallery(&self, gallery: Gallery) {
        let mut inner = self.inner.write().await;
        inner.galleries.push(gallery);
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn time_candidates(
        &self,
        reference: TimeReference,
    ) -> Result<Vec<TimeCandidate>, StoreError> {
        let inner = self.inner.read().await;
        let candidates = match reference {
            TimeReference::ShootDate => inner
                .shoots
                .iter()
                .map(|shoot| {
                    let client = inner.clients.get(&shoot.client_id);
                    TimeCandidate {
                        entity_id: shoot.id,
                        reference_date: shoot.date,
                        snapshot: serde_json::json!({
                            "shoot_type": shoot.shoot_type,
                            "shoot_status": shoot.status,
                            "client_type": client.and_then(|c| c.client_type.clone()),
                            "lead_source": client.and_then(|c| c.lead_source.clone()),
                            "client_city": client.and_then(|c| c.city.clone()),
                            "client_name": client.map(|c| c.name.clone()),
                            "shoot_title": shoot.title,
                            "shoot_location": shoot.location
                        }),
                    }
                })
                .collect(),
            TimeReference::InvoiceDueDate => inner
                .invoices
                .iter()
                .map(|invoice| {
                    let client = inner.clients.get(&invoice.client_id);
                    let shoot = find_shoot(&inner.shoots, invoice.shoot_id);
                    TimeCandidate {
                        entity_id: invoice.id,
                        reference_date: invoice.due_date,
                        snapshot: serde_json::json!({
                            "payment_status": invoice.status,
                            "order_amount": invoice.total.to_string(),
                            "shoot_type": shoot.and_then(|s| s.shoot_type.clone()),
                            "client_type": client.and_then(|c| c.client_type.clone()),
                            "lead_source": client.and_then(|c| c.lead_source.clone()),
                            "client_city": client.and_then(|c| c.city.clone()),
                            "client_name": client.map(|c| c.name.clone()),
                            "invoice_number": invoice.invoice_number
                        }),
                    }
                })
                .collect(),
            TimeReference::ContractDate => inner
                .contracts
                .iter()
                .map(|contract| {
                    let client = inner.clients.get(&contract.client_id);
                    let shoot = find_shoot(&inner.shoots, contract.shoot_id);
                    TimeCandidate {
                        entity_id: contract.id,
                        reference_date: contract.contract_date,
                        snapshot: serde_json::json!({
                            "shoot_type": shoot.and_then(|s| s.shoot_type.clone()),
                            "client_type": client.and_then(|c| c.client_type.clone()),
                            "lead_source": client.and_then(|c| c.lead_source.clone()),
                            "client_city": client.and_then(|c| c.city.clone()),
                            "client_name": client.map(|c| c.name.clone()),
                            "contract_title": contract.title
                        }),
                    }
                })
                .collect(),
            TimeReference::GalleryDeliveryDate => inner
                .galleries
                .iter()
                .filter_map(|gallery| {
                    let delivery_date = gallery.delivery_date?;
                    let client = inner.clients.get(&gallery.client_id);
                    let shoot = find_shoot(&inner.shoots, gallery.shoot_id);
                    Some(TimeCandidate {
                        entity_id: gallery.id,
                        reference_date: delivery_date,
                        snapshot: serde_json::json!({
                            "gallery_status": gallery.status,
                            "shoot_type": shoot.and_then(|s| s.shoot_type.clone()),
                            "client_type": client.and_then(|c| c.client_type.clone()),
                            "lead_source": client.and_then(|c| c.lead_source.clone()),
                            "client_city": client.and_then(|c| c.city.clone()),
                            "client_name": client.map(|c| c.name.clone()),
                            "gallery_title": gallery.title
                        }),
                    })
                })
                .collect(),
        };
        Ok(candidates)
    }
}

fn find_shoot(shoots: &[Shoot], shoot_id: Option<i64>) -> Option<&Shoot> {
    shoot_id.and_then(|id| shoots.iter().find(|s| s.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    fn sample_client(id: i64) -> Client {
        Client {
            id,
            name: "Maya Chen".to_string(),
            email: "maya@example.com".to_string(),
            phone: "555-0199".to_string(),
            address: None,
            city: Some("Portland".to_string()),
            state: None,
            zip_code: None,
            client_type: Some("couple".to_string()),
            lead_source: Some("instagram".to_string()),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_workflow(name: &str, active: bool) -> NewWorkflow {
        NewWorkflow {
            name: name.to_string(),
            description: None,
            is_active: active,
            steps: serde_json::json!([]),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryWorkflowStore::new();
        let first = store.create(sample_workflow("Wedding", true)).await.unwrap();
        let second = store.create(sample_workflow("Portrait", true)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_active_workflows_filters_inactive() {
        let store = InMemoryWorkflowStore::new();
        store.create(sample_workflow("Active", true)).await.unwrap();
        let parked = store.create(sample_workflow("Parked", false)).await.unwrap();

        let active = store.active_workflows().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Active");

        store.set_active(parked.id, true).await.unwrap();
        assert_eq!(store.active_workflows().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_provided_fields() {
        let store = InMemoryWorkflowStore::new();
        let created = store.create(sample_workflow("Draft", true)).await.unwrap();

        let updated = store
            .update(
                created.id,
                WorkflowUpdate {
                    name: Some("Renamed".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert!(!updated.is_active);
        assert_eq!(updated.steps, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_update_unknown_workflow_is_not_found() {
        let store = InMemoryWorkflowStore::new();
        let result = store.update(99, WorkflowUpdate::default()).await;
        assert!(matches!(result, Err(StoreError::WorkflowNotFound(99))));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let store = InMemoryWorkflowStore::new();
        let created = store.create(sample_workflow("Gone", true)).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shoot_candidates_join_client_fields() {
        let store = InMemoryEntityStore::new();
        store.add_client(sample_client(7)).await;
        store
            .add_shoot(Shoot {
                id: 31,
                title: "Chen Wedding".to_string(),
                client_id: 7,
                shoot_type: Some("Wedding".to_string()),
                date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                location: "Crystal Ballroom".to_string(),
                status: "confirmed".to_string(),
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;

        let candidates = store.time_candidates(TimeReference::ShootDate).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entity_id, 31);
        assert_eq!(
            candidates[0].reference_date,
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
        assert_eq!(
            candidates[0].snapshot.get("client_type").unwrap(),
            "couple"
        );
        assert_eq!(
            candidates[0].snapshot.get("shoot_type").unwrap(),
            "Wedding"
        );
    }

    #[tokio::test]
    async fn test_invoice_candidates_expose_amount_as_text() {
        let store = InMemoryEntityStore::new();
        store.add_client(sample_client(7)).await;
        store
            .add_invoice(Invoice {
                id: 12,
                invoice_number: "INV-0012".to_string(),
                client_id: 7,
                shoot_id: None,
                items: serde_json::json!([]),
                subtotal: Decimal::new(400000, 2),
                tax: Decimal::new(50000, 2),
                total: Decimal::new(450000, 2),
                status: "pending".to_string(),
                due_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;

        let candidates = store
            .time_candidates(TimeReference::InvoiceDueDate)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].snapshot.get("order_amount").unwrap(),
            "4500.00"
        );
        assert_eq!(
            candidates[0].snapshot.get("payment_status").unwrap(),
            "pending"
        );
    }

    #[tokio::test]
    async fn test_undelivered_galleries_are_not_candidates() {
        let store = InMemoryEntityStore::new();
        store.add_client(sample_client(7)).await;
        store
            .add_gallery(Gallery {
                id: 3,
                title: "Sneak Peeks".to_string(),
                client_id: 7,
                shoot_id: None,
                cover_image: None,
                photos: serde_json::json!([]),
                status: "draft".to_string(),
                password: None,
                delivery_date: None,
                expiry_date: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;
        store
            .add_gallery(Gallery {
                id: 4,
                title: "Full Gallery".to_string(),
                client_id: 7,
                shoot_id: None,
                cover_image: None,
                photos: serde_json::json!([]),
                status: "delivered".to_string(),
                password: None,
                delivery_date: NaiveDate::from_ymd_opt(2025, 7, 10),
                expiry_date: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;

        let candidates = store
            .time_candidates(TimeReference::GalleryDeliveryDate)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entity_id, 4);
    }

    #[tokio::test]
    async fn test_gallery_candidates_join_the_linked_shoot() {
        let store = InMemoryEntityStore::new();
        store.add_client(sample_client(7)).await;
        store
            .add_shoot(Shoot {
                id: 31,
                title: "Autumn Portraits".to_string(),
                client_id: 7,
                shoot_type: Some("Portrait".to_string()),
                date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                location: "Laurelhurst Park".to_string(),
                status: "completed".to_string(),
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;
        store
            .add_gallery(Gallery {
                id: 4,
                title: "Autumn Highlights".to_string(),
                client_id: 7,
                shoot_id: Some(31),
                cover_image: None,
                photos: serde_json::json!([]),
                status: "delivered".to_string(),
                password: None,
                delivery_date: NaiveDate::from_ymd_opt(2025, 7, 1),
                expiry_date: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;

        let candidates = store
            .time_candidates(TimeReference::GalleryDeliveryDate)
            .await
            .unwrap();
        assert_eq!(candidates[0].snapshot.get("shoot_type").unwrap(), "Portrait");
    }

    #[tokio::test]
    async fn test_missing_client_yields_null_client_fields() {
        let store = InMemoryEntityStore::new();
        store
            .add_contract(Contract {
                id: 9,
                client_id: 404,
                shoot_id: None,
                title: "Standard Agreement".to_string(),
                status: "sent".to_string(),
                contract_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                sent_at: None,
                signed_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;

        let candidates = store
            .time_candidates(TimeReference::ContractDate)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].snapshot.get("client_type").unwrap().is_null());
    }
}
