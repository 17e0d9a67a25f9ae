//! Land use: surfaces, soil management, fertilization and crop protection.

use super::{field, number, sums_to, Section};
use crate::validate::{
    validate_numeric, validate_optional_numeric, validate_percentage, validate_text, Validation,
};
use tambo_db::{EntityKind, FormData};

fn non_negative(form: &FormData, key: &str, v: &mut Validation, label: &str) -> bool {
    v.check(
        validate_numeric(field(form, key), Some(0.0), None),
        format!("{} must be a number >= 0.", label),
    )
}

pub struct SurfaceSection;

impl Section for SurfaceSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Surface
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(validate_text(field(form, "cultivo"), 1), "Crop is required.");
        non_negative(form, "hectareas", v, "Hectares");
        non_negative(form, "productividad_materia_verde", v, "Green matter productivity");
        non_negative(form, "residuos_generados", v, "Waste generated");
    }
}

pub struct ManagementSection;

impl Section for ManagementSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Management
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        let covered = v.check(
            validate_percentage(field(form, "proporción_cobertura")),
            "Covered soil proportion must be a percentage between 0 and 100.",
        );
        let bare = v.check(
            validate_percentage(field(form, "proporción_suelo_sin_cobertura")),
            "Bare soil proportion must be a percentage between 0 and 100.",
        );
        if covered && bare {
            let total = number(form, "proporción_cobertura")
                + number(form, "proporción_suelo_sin_cobertura");
            v.check(
                sums_to(total, 100.0),
                format!("Covered and bare soil must add up to 100% (got {}%).", total),
            );
        }
        v.check(
            validate_optional_numeric(field(form, "año_cambio_manejo"), Some(1900.0), Some(2100.0)),
            "Management change year must be between 1900 and 2100.",
        );
    }
}

pub struct FertilizationSection;

impl Section for FertilizationSection {
    fn kind(&self) -> EntityKind {
        EntityKind::Fertilization
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        non_negative(form, "hectareas", v, "Hectares");
        v.check(validate_text(field(form, "tipo"), 1), "Fertilizer type is required.");
        v.check(
            validate_percentage(field(form, "%_área_total")),
            "Share of total area must be a percentage between 0 and 100.",
        );
        non_negative(form, "cantidad_aplicada_kg_ha", v, "Applied quantity per hectare");
    }
}

pub struct CropProtectionSection;

impl Section for CropProtectionSection {
    fn kind(&self) -> EntityKind {
        EntityKind::CropProtection
    }

    fn check(&self, form: &FormData, v: &mut Validation) {
        v.check(validate_text(field(form, "área"), 1), "Area is required.");
        v.check(validate_text(field(form, "producto"), 1), "Product is required.");
        v.check(
            validate_text(field(form, "ingrediente_activo"), 1),
            "Active ingredient is required.",
        );
        v.check(
            validate_percentage(field(form, "%_ingrediente_activo")),
            "Active ingredient percentage must be between 0 and 100.",
        );
        non_negative(form, "dosis", v, "Dose");
    }
}

#[cfg(test)]
mod tests {
    use crate::sections::test_forms::{form, messages};
    use serde_json::json;
    use tambo_db::EntityKind;

    #[test]
    fn test_surface_requires_crop() {
        let f = form(&[("hectareas", json!(10)), ("productividad_materia_verde", json!(0)), ("residuos_generados", json!(0))]);
        assert_eq!(messages(EntityKind::Surface, &f), vec!["Crop is required."]);
    }

    #[test]
    fn test_management_proportions_sum_to_100() {
        let ok = form(&[
            ("proporción_cobertura", json!(70)),
            ("proporción_suelo_sin_cobertura", json!(30)),
            ("año_cambio_manejo", json!("")),
        ]);
        assert!(messages(EntityKind::Management, &ok).is_empty());

        let bad = form(&[
            ("proporción_cobertura", json!(70)),
            ("proporción_suelo_sin_cobertura", json!(20)),
            ("año_cambio_manejo", json!(1850)),
        ]);
        assert_eq!(messages(EntityKind::Management, &bad).len(), 2);
    }

    #[test]
    fn test_crop_protection_rules() {
        let f = form(&[
            ("área", json!("Lote 3")),
            ("producto", json!("Glifosato")),
            ("ingrediente_activo", json!("")),
            ("%_ingrediente_activo", json!(150)),
            ("dosis", json!(2)),
        ]);
        assert_eq!(messages(EntityKind::CropProtection, &f).len(), 2);
    }

    #[test]
    fn test_fertilization_rules() {
        let f = form(&[
            ("hectareas", json!(-1)),
            ("tipo", json!("Urea")),
            ("%_área_total", json!(40)),
            ("cantidad_aplicada_kg_ha", json!(100)),
        ]);
        assert_eq!(messages(EntityKind::Fertilization, &f), vec!["Hectares must be a number >= 0."]);
    }
}
