//! Water, energy and effluent management.

use super::{field, is_yes, number, Section};
use crate::validate::{as_text, validate_numeric, validate_percentage, Validation};
use tambo_db::{EntityKind, FormData};

const WATER_USES: [&str; 3] = ["uso_para_bebida", "uso_para_limpieza", "uso_para_riego"];

pub struct IrrigationSection;

impl Section for IrrigationSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Irrigation
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(
            validate_numeric(field(form, "consumo_total"), Some(0.0), None),
            "Total water consumption must be a number >= 0.",
        );

        let mut valid = true;
        for key in WATER_USES {
            valid &= v.check(
                validate_percentage(field(form, key)),
                format!("{} must be a percentage between 0 and 100.", key),
            );
        }
        if valid {
            let total: f64 = WATER_USES.iter().map(|k| number(form, k)).sum();
            v.check(
                total <= 100.0,
                format!("Water uses cannot exceed 100% in total (got {}%).", total),
            );
        }
    }
}

pub struct EnergySection;

impl Section for EnergySection {
    fn kind(&self) -> EntityKind {
        EntityKind::Energy
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        for (key, label) in [
            ("consumo_diesel", "Diesel"),
            ("consumo_gasolina", "Gasoline"),
            ("consumo_GNC", "GNC"),
            ("consumo_electricidad", "Electricity"),
        ] {
            v.check(
                validate_numeric(field(form, key), Some(0.0), None),
                format!("{} consumption must be a number >= 0.", label),
            );
        }

        if is_yes(field(form, "uso_paneles_solares")) {
            v.check(
                validate_numeric(field(form, "capacidad_paneles"), Some(0.0), None),
                "Solar panel capacity must be a number >= 0.",
            );
        }
        if is_yes(field(form, "uso_biodigestores")) {
            v.check(
                validate_numeric(field(form, "capacidad_biodigestores"), Some(0.0), None),
                "Biodigester capacity must be a number >= 0.",
            );
        }
    }
}

pub struct EffluentSection;

impl EffluentSection {
    fn separates_solids(form: &FormData) -> bool {
        as_text(field(form, "manejo_excretas"))
            .is_some_and(|s| s.trim().to_lowercase().starts_with("separaci"))
    }
}

impl Section for EffluentSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Effluent
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(
            validate_numeric(field(form, "horas_dia"), Some(0.0), Some(24.0)),
            "Hours per day must be between 0 and 24.",
        );
        if Self::separates_solids(form) {
            v.check(
                validate_percentage(field(form, "eficiencia_separación")),
                "Separation efficiency must be a percentage between 0 and 100.",
            );
        }
    }
}
