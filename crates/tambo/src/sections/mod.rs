//! Section controllers.
//!
//! One controller per survey section. A controller only knows the business
//! rules of its form; [`submit`] runs them, converts the form into a typed
//! record and hands it to the store. Nothing is written when a rule fails.

mod general;
mod land;
mod livestock;
mod resources;
mod transport;

pub use general::FarmSection;
pub use land::{CropProtectionSection, FertilizationSection, ManagementSection, SurfaceSection};
pub use livestock::HerdSection;
pub use resources::{EffluentSection, EnergySection, IrrigationSection};
pub use transport::TransportSection;

use crate::context::SessionContext;
use crate::validate::{as_number, as_text, validate_integer, Validation, ValidationErrors};
use serde_json::Value;
use tambo_db::{
    ColumnType, DbError, EntityKind, FormData, Record, RecordId, UpsertOutcome, ID_FORM_KEY,
};
use tracing::{debug, warn};

/// Business rules of one survey form.
pub trait Section: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Record every rule the form breaks.
    fn check(&self, form: &FormData, v: &mut Validation);
}

/// Why a submission was not stored.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] DbError),
}

/// The controller for a section.
pub fn controller(kind: EntityKind) -> &'static dyn Section {
    match kind {
        EntityKind::Farm => &FarmSection,
        EntityKind::Surface => &SurfaceSection,
        EntityKind::Management => &ManagementSection,
        EntityKind::Fertilization => &FertilizationSection,
        EntityKind::CropProtection => &CropProtectionSection,
        EntityKind::Irrigation => &IrrigationSection,
        EntityKind::Energy => &EnergySection,
        EntityKind::Herd => &HerdSection,
        EntityKind::Effluent => &EffluentSection,
        EntityKind::Transport => &TransportSection,
    }
}

/// Run the section's rules over `form` without writing anything.
pub fn check(kind: EntityKind, form: &FormData) -> Result<(), ValidationErrors> {
    let mut v = Validation::new();
    controller(kind).check(form, &mut v);
    check_whole_numbers(kind, form, &mut v);
    v.finish()
}

/// Integer columns reject fractional numbers. Non-numeric values are left to
/// the section's own rules.
fn check_whole_numbers(kind: EntityKind, form: &FormData, v: &mut Validation) {
    let integer_columns = kind
        .columns()
        .iter()
        .filter(|c| matches!(c.ty, ColumnType::Integer | ColumnType::OptionalInteger));

    for column in integer_columns {
        let value = field(form, column.form_key);
        if as_number(value).is_some() {
            v.check(
                validate_integer(value),
                format!("{} must be a whole number (got {}).", column.form_key, value),
            );
        }
    }
}

/// Validate and store one form submission.
///
/// A `uuid` key in the form names the record to overwrite. Child sections
/// attach to the context's farm, or to the most recent farm when the context
/// has none.
pub async fn submit(
    ctx: &SessionContext,
    kind: EntityKind,
    form: &FormData,
) -> Result<UpsertOutcome, SubmitError> {
    if let Err(errors) = check(kind, form) {
        warn!(section = %kind, errors = errors.messages.len(), "Submission rejected");
        return Err(errors.into());
    }

    let record = Record::from_form(kind, form)?;
    let id = form_id(form)?;
    debug!(section = %kind, id = ?id, "Submitting record");

    let outcome = ctx.db().upsert(&record, id.as_ref(), ctx.farm()).await?;
    Ok(outcome)
}

/// The record identifier carried by a form, if any.
pub fn form_id(form: &FormData) -> Result<Option<RecordId>, DbError> {
    match form.get(ID_FORM_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(RecordId::parse(s)?)),
        Some(_) => Err(DbError::invalid_field(ID_FORM_KEY, "expected a UUID string")),
    }
}

static NULL: Value = Value::Null;

/// A form value, null when absent.
pub(crate) fn field<'a>(form: &'a FormData, key: &str) -> &'a Value {
    form.get(key).unwrap_or(&NULL)
}

/// A numeric form value, 0 when absent or not a number.
pub(crate) fn number(form: &FormData, key: &str) -> f64 {
    as_number(field(form, key)).unwrap_or(0.0)
}

/// "Sí"/"Si"/"yes"/"true" answers.
pub(crate) fn is_yes(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => as_text(other).is_some_and(|s| {
            matches!(
                s.trim().to_lowercase().as_str(),
                "sí" | "si" | "yes" | "true"
            )
        }),
    }
}

/// Sums entered as percentages are compared with a small tolerance.
pub(crate) fn sums_to(total: f64, expected: f64) -> bool {
    (total - expected).abs() < 1e-9
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_kind_has_a_controller() {
        for kind in EntityKind::ALL {
            assert_eq!(controller(kind).kind(), kind);
        }
    }

    #[test]
    fn test_form_id() {
        let mut form = FormData::new();
        assert_eq!(form_id(&form).unwrap(), None);

        form.insert("uuid".into(), json!(""));
        assert_eq!(form_id(&form).unwrap(), None);

        let id = RecordId::new();
        form.insert("uuid".into(), json!(id.as_str()));
        assert_eq!(form_id(&form).unwrap(), Some(id));

        form.insert("uuid".into(), json!("not-a-uuid"));
        assert!(matches!(form_id(&form), Err(DbError::InvalidId(_))));
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes(&json!("Sí")));
        assert!(is_yes(&json!(" si ")));
        assert!(is_yes(&json!(true)));
        assert!(!is_yes(&json!("No")));
        assert!(!is_yes(&Value::Null));
    }
}
