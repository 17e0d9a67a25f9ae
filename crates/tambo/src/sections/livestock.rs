//! Herd composition.

use super::{field, number, sums_to, Section};
use crate::validate::{validate_numeric, validate_percentage, Validation};
use tambo_db::{EntityKind, FormData};

const DIET: [&str; 3] = ["porcentaje_pastura", "porcentaje_concentrado", "porcentaje_otros"];

pub struct HerdSection;

impl Section for HerdSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Herd
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(
            validate_numeric(field(form, "número_animales"), Some(0.0), None),
            "Animal count must be a number >= 0.",
        );
        v.check(
            validate_numeric(field(form, "peso_promedio"), Some(0.0), None),
            "Average weight must be a number >= 0.",
        );
        v.check(
            validate_numeric(field(form, "horas_pastoreo"), Some(0.0), Some(24.0)),
            "Grazing hours must be between 0 and 24.",
        );
        v.check(
            validate_numeric(field(form, "dieta_materia_seca"), Some(0.0), None),
            "Dry matter diet must be a number >= 0.",
        );

        // diet composition is optional: all zero/blank means not given
        let mut valid = true;
        for key in DIET {
            let value = field(form, key);
            if !value.is_null() && value.as_str() != Some("") {
                valid &= v.check(
                    validate_percentage(value),
                    format!("{} must be a percentage between 0 and 100.", key),
                );
            }
        }
        if valid {
            let total: f64 = DIET.iter().map(|k| number(form, k)).sum();
            if total > 0.0 {
                v.check(
                    sums_to(total, 100.0),
                    format!("Diet composition must add up to 100% (got {}%).", total),
                );
            }
        }
    }
}
