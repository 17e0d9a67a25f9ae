//! Per-request session context.

use crate::sections::{self, SubmitError};
use tambo_db::{
    DbError, EntityKind, FarmId, FarmSnapshot, FormData, StoredRecord, TamboDb, UpsertOutcome,
};
use tracing::info;

/// The store handle plus the farm a request is working on.
///
/// Created per command (or per request) and dropped afterwards. Without an
/// explicit farm, child sections fall back to the most recently created farm.
#[derive(Clone)]
pub struct SessionContext {
    db: TamboDb,
    farm: Option<FarmId>,
}

impl SessionContext {
    pub fn new(db: TamboDb) -> Self {
        Self { db, farm: None }
    }

    pub fn with_farm(db: TamboDb, farm: Option<FarmId>) -> Self {
        Self { db, farm }
    }

    pub fn db(&self) -> &TamboDb {
        &self.db
    }

    /// The explicitly selected farm, if any.
    pub fn farm(&self) -> Option<&FarmId> {
        self.farm.as_ref()
    }

    pub fn set_farm(&mut self, farm: FarmId) {
        self.farm = Some(farm);
    }

    /// Validate and store a form. A stored farm becomes the current farm.
    pub async fn submit(
        &mut self,
        kind: EntityKind,
        form: &FormData,
    ) -> Result<UpsertOutcome, SubmitError> {
        let outcome = sections::submit(self, kind, form).await?;
        if kind.is_root() {
            info!(farm_id = %outcome.farm_id, "Current farm set");
            self.farm = Some(outcome.farm_id.clone());
        }
        Ok(outcome)
    }

    pub async fn get(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, DbError> {
        self.db.get(kind, self.farm()).await
    }

    pub async fn delete_last(&self, kind: EntityKind) -> Result<bool, DbError> {
        self.db.delete_last(kind).await
    }

    pub async fn snapshot(&self) -> Result<Option<FarmSnapshot>, DbError> {
        self.db.snapshot(self.farm()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn farm_form(name: &str) -> FormData {
        [
            ("nombre_tambo", json!(name)),
            ("ciudad", json!("Rafaela")),
            ("año", json!(2024)),
            ("sup_total", json!(100)),
            ("sup_vt", json!(80)),
            ("produccion_ind", json!(22)),
            ("vacas_ordeñe", json!(150)),
            ("venta_industria", json!(60)),
            ("uso_queseria", json!(30)),
            ("descarte", json!(10)),
            ("porcentaje_proteina", json!(3.3)),
            ("porcentaje_grasa", json!(3.6)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn transport_form() -> FormData {
        [
            ("producto_transportado", json!("Leche")),
            ("inicio", json!("Tambo")),
            ("destino", json!("Usina")),
            ("distancia_km", json!(40)),
            ("carga_promedio", json!(18)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[tokio::test]
    async fn test_submitted_farm_becomes_current() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let mut ctx = SessionContext::new(db.clone());

        let first = ctx.submit(EntityKind::Farm, &farm_form("Uno")).await.unwrap();
        assert_eq!(ctx.farm(), Some(&first.farm_id));

        // a newer farm created elsewhere does not steal this session's children
        let mut other = SessionContext::new(db.clone());
        other.submit(EntityKind::Farm, &farm_form("Dos")).await.unwrap();

        let outcome = ctx.submit(EntityKind::Transport, &transport_form()).await.unwrap();
        assert_eq!(outcome.farm_id, first.farm_id);
        assert_eq!(ctx.get(EntityKind::Transport).await.unwrap().len(), 1);
        assert!(other.get(EntityKind::Transport).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_submission_writes_nothing() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let mut ctx = SessionContext::new(db.clone());

        let mut form = farm_form("Uno");
        form.insert("descarte".into(), json!(20));

        let err = ctx.submit(EntityKind::Farm, &form).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert!(!db.exists_any().await.unwrap());
        assert_eq!(ctx.farm(), None);
    }

    #[tokio::test]
    async fn test_fractional_integers_fail_validation_not_storage() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let mut ctx = SessionContext::new(db.clone());

        let mut form = farm_form("Uno");
        form.insert("año".into(), json!(2024.5));
        form.insert("vacas_ordeñe".into(), json!(150.25));

        let err = ctx.submit(EntityKind::Farm, &form).await.unwrap_err();
        let SubmitError::Validation(errors) = err else {
            panic!("expected validation errors, got {:?}", err);
        };
        assert_eq!(errors.messages.len(), 2, "{:?}", errors.messages);
        assert!(!db.exists_any().await.unwrap());
    }

    #[tokio::test]
    async fn test_child_without_farm_reports_no_farm() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let mut ctx = SessionContext::new(db);

        let err = ctx
            .submit(EntityKind::Transport, &transport_form())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Store(DbError::NoFarm)));
    }

    #[tokio::test]
    async fn test_resubmitting_with_uuid_updates_in_place() {
        let db = TamboDb::open_in_memory().await.unwrap();
        let mut ctx = SessionContext::new(db);

        let created = ctx.submit(EntityKind::Farm, &farm_form("Uno")).await.unwrap();
        let mut edit = farm_form("Uno (editado)");
        edit.insert("uuid".into(), json!(created.id.as_str()));

        let updated = ctx.submit(EntityKind::Farm, &edit).await.unwrap();
        assert!(!updated.is_new);

        let farms = ctx.db().get(EntityKind::Farm, None).await.unwrap();
        assert_eq!(farms.len(), 1);
        assert_eq!(farms[0].record.as_farm().unwrap().name, "Uno (editado)");
    }
}
