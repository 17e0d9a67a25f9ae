//! Milk and input transport.

use super::{field, Section};
use crate::validate::{validate_numeric, validate_text, Validation};
use tambo_db::{EntityKind, FormData};

pub struct TransportSection;

impl Section for TransportSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Transport
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(
            validate_text(field(form, "producto_transportado"), 1),
            "Transported product is required.",
        );
        v.check(validate_text(field(form, "inicio"), 1), "Origin is required.");
        v.check(validate_text(field(form, "destino"), 1), "Destination is required.");
        v.check(
            validate_numeric(field(form, "distancia_km"), Some(0.0), None),
            "Distance must be a number >= 0.",
        );
        v.check(
            validate_numeric(field(form, "carga_promedio"), Some(0.0), None),
            "Average load must be a number >= 0.",
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::sections::test_forms::{form, messages};
    use serde_json::json;
    use tambo_db::EntityKind;

    #[test]
    fn test_transport_rules() {
        let f = form(&[
            ("producto_transportado", json!("Leche")),
            ("inicio", json!("Tambo")),
            ("destino", json!("")),
            ("distancia_km", json!("35")),
            ("carga_promedio", json!(-1)),
        ]);
        assert_eq!(
            messages(EntityKind::Transport, &f),
            vec!["Destination is required.", "Average load must be a number >= 0."]
        );
    }
}
