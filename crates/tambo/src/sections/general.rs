//! General farm data.

use super::{field, number, sums_to, Section};
use crate::validate::{validate_numeric, validate_percentage, validate_text, Validation};
use tambo_db::{EntityKind, FormData};

pub struct FarmSection;

const MILK_DESTINATIONS: [&str; 3] = ["venta_industria", "uso_queseria", "descarte"];

impl Section for FarmSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Farm
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(validate_text(field(form, "nombre_tambo"), 1), "Farm name is required.");
        v.check(validate_text(field(form, "ciudad"), 1), "City is required.");

        let total_ok = v.check(
            validate_numeric(field(form, "sup_total"), Some(0.0), None),
            "Total area must be a number >= 0.",
        );
        let cows_ok = v.check(
            validate_numeric(field(form, "sup_vt"), Some(0.0), None),
            "Milking herd area must be a number >= 0.",
        );
        if total_ok && cows_ok {
            v.check(
                number(form, "sup_vt") <= number(form, "sup_total"),
                "Milking herd area cannot exceed total area.",
            );
        }
        v.check(
            validate_numeric(field(form, "produccion_ind"), Some(0.0), None),
            "Production per cow must be a number >= 0.",
        );
        v.check(
            validate_numeric(field(form, "vacas_ordeñe"), Some(0.0), None),
            "Milking cows must be a number >= 0.",
        );

        let mut all_valid = true;
        for key in MILK_DESTINATIONS {
            all_valid &= v.check(
                validate_percentage(field(form, key)),
                format!("{} must be a percentage between 0 and 100.", key),
            );
        }
        if all_valid {
            let total: f64 = MILK_DESTINATIONS.iter().map(|k| number(form, k)).sum();
            v.check(
                sums_to(total, 100.0),
                format!("Milk destinations must add up to 100% (got {}%).", total),
            );
        }

        v.check(
            validate_numeric(field(form, "porcentaje_proteina"), Some(0.0), Some(10.0)),
            "Protein percentage must be between 0 and 10.",
        );
        v.check(
            validate_numeric(field(form, "porcentaje_grasa"), Some(0.0), Some(10.0)),
            "Fat percentage must be between 0 and 10.",
        );
        v.check(
            validate_numeric(field(form, "año"), Some(2000.0), Some(2100.0)),
            "Year must be between 2000 and 2100.",
        );
    }
}
