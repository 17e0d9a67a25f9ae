//! Typed survey records.
//!
//! One struct per entity kind, holding only the domain attributes a section
//! form collects. Identifiers, the parent reference and the creation time
//! live on [`StoredRecord`]. Serde names follow the form keys so a record
//! serializes back into the same flat shape it was submitted in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;
use tambo_ids::{FarmId, RecordId};

use crate::entity::EntityKind;
use crate::error::{DbError, Result};
use crate::value::{ColumnDef, FieldValue, FormData, SqlValue, ID_FORM_KEY};

macro_rules! define_record {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident: $ty:ty => ($column:literal, $form:literal)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(rename = $form, default)]
                pub $field: $ty,
            )*
        }

        impl $name {
            pub const KIND: EntityKind = EntityKind::$kind;

            /// Domain columns in table order.
            pub const COLUMNS: &'static [ColumnDef] = &[
                $(
                    ColumnDef {
                        column: $column,
                        form_key: $form,
                        ty: <$ty as FieldValue>::TYPE,
                    },
                )*
            ];

            /// Build from a flat form; unknown keys are ignored.
            pub fn from_form(form: &FormData) -> Result<Self> {
                Ok(Self {
                    $(
                        $field: <$ty as FieldValue>::from_form(form.get($form))
                            .map_err(|reason| DbError::invalid_field($form, reason))?,
                    )*
                })
            }

            pub fn to_form(&self) -> FormData {
                let mut form = FormData::new();
                $( form.insert($form.to_string(), FieldValue::to_form(&self.$field)); )*
                form
            }

            pub(crate) fn sql_values(&self) -> Vec<SqlValue> {
                vec![ $( FieldValue::to_sql(&self.$field), )* ]
            }

            pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
                Ok(Self {
                    $( $field: row.try_get($column)?, )*
                })
            }
        }

        impl From<$name> for Record {
            fn from(record: $name) -> Self {
                Record::$kind(record)
            }
        }
    };
}

define_record! {
    /// General farm data (datos generales). The root entity.
    Farm => Farm {
        name: String => ("name", "nombre_tambo"),
        city: String => ("city", "ciudad"),
        breed: String => ("breed", "raza"),
        year: i64 => ("year", "año"),
        month: String => ("month", "mes"),
        /// Hectares
        total_area: f64 => ("total_area", "sup_total"),
        /// Hectares allocated to the milking herd
        total_cows_area: f64 => ("total_cows_area", "sup_vt"),
        /// Litres per cow per day
        production_per_cow: f64 => ("production_per_cow", "produccion_ind"),
        milking_cows: i64 => ("milking_cows", "vacas_ordeñe"),
        industry_sales_percentage: f64 => ("industry_sales_percentage", "venta_industria"),
        cheese_usage_percentage: f64 => ("cheese_usage_percentage", "uso_queseria"),
        discard_percentage: f64 => ("discard_percentage", "descarte"),
        protein_percentage: f64 => ("protein_percentage", "porcentaje_proteina"),
        fat_percentage: f64 => ("fat_percentage", "porcentaje_grasa"),
    }
}

define_record! {
    /// Cultivated surfaces and their inputs (superficies e insumos).
    Surface => Surface {
        crop: String => ("crop", "cultivo"),
        season: String => ("season", "temporada"),
        hectares: f64 => ("hectares", "hectareas"),
        green_matter_productivity: f64 => ("green_matter_productivity", "productividad_materia_verde"),
        waste_generated: f64 => ("waste_generated", "residuos_generados"),
        waste_destination: String => ("waste_destination", "destino_residuos"),
    }
}

define_record! {
    /// Soil management (manejo de recursos).
    Management => Management {
        tillage_type: String => ("tillage_type", "tipo_labranza"),
        coverage_proportion: i64 => ("coverage_proportion", "proporción_cobertura"),
        no_coverage_proportion: i64 => ("no_coverage_proportion", "proporción_suelo_sin_cobertura"),
        soil_changes: String => ("soil_changes", "manejo_suelos_cambios"),
        soil_change_year: Option<i64> => ("soil_change_year", "año_cambio_manejo"),
    }
}

define_record! {
    Fertilization => Fertilization {
        area: String => ("area", "área"),
        hectares: f64 => ("hectares", "hectareas"),
        fertilizer_type: String => ("type", "tipo"),
        area_percentage: i64 => ("area_percentage", "%_área_total"),
        applied_quantity_kg_ha: f64 => ("applied_quantity_kg_ha", "cantidad_aplicada_kg_ha"),
        applied_quantity_total: f64 => ("applied_quantity_total", "cantidad_aplicada_total"),
        application_method: String => ("application_method", "método_aplicación"),
        use_inhibitors: String => ("use_inhibitors", "uso_inhibidores"),
        protected_urea: String => ("protected_urea", "urea_protegida"),
        n_adjustment: String => ("n_adjustment", "ajuste_por_N"),
    }
}

define_record! {
    CropProtection => CropProtection {
        area: String => ("area", "área"),
        product: String => ("product", "producto"),
        category: String => ("category", "categoría"),
        application_type: String => ("application_type", "tipo_aplicacion"),
        active_ingredient_percentage: f64 => ("active_ingredient_percentage", "%_ingrediente_activo"),
        dose: f64 => ("dose", "dosis"),
        active_ingredient: String => ("active_ingredient", "ingrediente_activo"),
    }
}

define_record! {
    /// Water sources and uses (riego).
    Irrigation => Irrigation {
        source_type: String => ("source_type", "tipo_fuente"),
        total_consumption: f64 => ("total_consumption", "consumo_total"),
        drinking_use: i64 => ("drinking_use", "uso_para_bebida"),
        cleaning_use: i64 => ("cleaning_use", "uso_para_limpieza"),
        irrigation_use: i64 => ("irrigation_use", "uso_para_riego"),
        water_permit: String => ("water_permit", "permiso_agua"),
        irrigation_monitoring: String => ("irrigation_monitoring", "monitoreo_riego"),
        irrigation_events: String => ("irrigation_events", "eventos_riego"),
    }
}

define_record! {
    Energy => Energy {
        diesel_consumption: f64 => ("diesel_consumption", "consumo_diesel"),
        gasoline_consumption: f64 => ("gasoline_consumption", "consumo_gasolina"),
        gnc_consumption: f64 => ("gnc_consumption", "consumo_GNC"),
        electricity_consumption: f64 => ("electricity_consumption", "consumo_electricidad"),
        use_solar_panels: String => ("use_solar_panels", "uso_paneles_solares"),
        solar_panels_capacity: f64 => ("solar_panels_capacity", "capacidad_paneles"),
        use_biodigesters: String => ("use_biodigesters", "uso_biodigestores"),
        biodigesters_capacity: f64 => ("biodigesters_capacity", "capacidad_biodigestores"),
    }
}

define_record! {
    /// One herd category (rebaño).
    Herd => Herd {
        category: String => ("category", "categoría"),
        animal_count: i64 => ("animal_count", "número_animales"),
        /// Kilograms live weight
        average_weight: f64 => ("average_weight", "peso_promedio"),
        grazing_hours: i64 => ("grazing_hours", "horas_pastoreo"),
        /// Kilograms of dry matter per animal per day
        dry_matter_diet: f64 => ("dry_matter_diet", "dieta_materia_seca"),
        pasture_percentage: i64 => ("pasture_percentage", "porcentaje_pastura"),
        concentrate_percentage: i64 => ("concentrate_percentage", "porcentaje_concentrado"),
        others_percentage: i64 => ("others_percentage", "porcentaje_otros"),
    }
}

define_record! {
    Effluent => Effluent {
        sector: String => ("sector", "sector"),
        hours_per_day: i64 => ("hours_per_day", "horas_dia"),
        excreta_management: String => ("excreta_management", "manejo_excretas"),
        separation_efficiency: i64 => ("separation_efficiency", "eficiencia_separación"),
        liquid_destination: String => ("liquid_destination", "destino_liquidos"),
        solid_destination: String => ("solid_destination", "destino_solidos"),
    }
}

define_record! {
    Transport => Transport {
        transported_product: String => ("transported_product", "producto_transportado"),
        origin: String => ("origin", "inicio"),
        destination: String => ("destination", "destino"),
        distance_km: f64 => ("distance_km", "distancia_km"),
        vehicle_type: String => ("vehicle_type", "tipo_vehiculo"),
        frequency: String => ("frequency", "frecuencia"),
        fuel_type: String => ("fuel_type", "tipo_combustible"),
        /// Tonnes per trip
        average_load: f64 => ("average_load", "carga_promedio"),
    }
}

/// A record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Farm(Farm),
    Surface(Surface),
    Management(Management),
    Fertilization(Fertilization),
    CropProtection(CropProtection),
    Irrigation(Irrigation),
    Energy(Energy),
    Herd(Herd),
    Effluent(Effluent),
    Transport(Transport),
}

/// Expands `$body` once per variant with `$r` bound to the inner record.
macro_rules! each_record {
    ($record:expr, $r:ident => $body:expr) => {
        match $record {
            Record::Farm($r) => $body,
            Record::Surface($r) => $body,
            Record::Management($r) => $body,
            Record::Fertilization($r) => $body,
            Record::CropProtection($r) => $body,
            Record::Irrigation($r) => $body,
            Record::Energy($r) => $body,
            Record::Herd($r) => $body,
            Record::Effluent($r) => $body,
            Record::Transport($r) => $body,
        }
    };
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Farm(_) => EntityKind::Farm,
            Record::Surface(_) => EntityKind::Surface,
            Record::Management(_) => EntityKind::Management,
            Record::Fertilization(_) => EntityKind::Fertilization,
            Record::CropProtection(_) => EntityKind::CropProtection,
            Record::Irrigation(_) => EntityKind::Irrigation,
            Record::Energy(_) => EntityKind::Energy,
            Record::Herd(_) => EntityKind::Herd,
            Record::Effluent(_) => EntityKind::Effluent,
            Record::Transport(_) => EntityKind::Transport,
        }
    }

    /// Build the typed record for `kind` from a flat form.
    pub fn from_form(kind: EntityKind, form: &FormData) -> Result<Self> {
        Ok(match kind {
            EntityKind::Farm => Farm::from_form(form)?.into(),
            EntityKind::Surface => Surface::from_form(form)?.into(),
            EntityKind::Management => Management::from_form(form)?.into(),
            EntityKind::Fertilization => Fertilization::from_form(form)?.into(),
            EntityKind::CropProtection => CropProtection::from_form(form)?.into(),
            EntityKind::Irrigation => Irrigation::from_form(form)?.into(),
            EntityKind::Energy => Energy::from_form(form)?.into(),
            EntityKind::Herd => Herd::from_form(form)?.into(),
            EntityKind::Effluent => Effluent::from_form(form)?.into(),
            EntityKind::Transport => Transport::from_form(form)?.into(),
        })
    }

    pub fn to_form(&self) -> FormData {
        each_record!(self, r => r.to_form())
    }

    pub fn as_farm(&self) -> Option<&Farm> {
        match self {
            Record::Farm(farm) => Some(farm),
            _ => None,
        }
    }

    pub fn as_herd(&self) -> Option<&Herd> {
        match self {
            Record::Herd(herd) => Some(herd),
            _ => None,
        }
    }

    pub(crate) fn sql_values(&self) -> Vec<SqlValue> {
        each_record!(self, r => r.sql_values())
    }

    pub(crate) fn from_row(kind: EntityKind, row: &SqliteRow) -> Result<Self> {
        Ok(match kind {
            EntityKind::Farm => Farm::from_row(row)?.into(),
            EntityKind::Surface => Surface::from_row(row)?.into(),
            EntityKind::Management => Management::from_row(row)?.into(),
            EntityKind::Fertilization => Fertilization::from_row(row)?.into(),
            EntityKind::CropProtection => CropProtection::from_row(row)?.into(),
            EntityKind::Irrigation => Irrigation::from_row(row)?.into(),
            EntityKind::Energy => Energy::from_row(row)?.into(),
            EntityKind::Herd => Herd::from_row(row)?.into(),
            EntityKind::Effluent => Effluent::from_row(row)?.into(),
            EntityKind::Transport => Transport::from_row(row)?.into(),
        })
    }
}

impl EntityKind {
    /// Domain columns of this kind, in table order.
    pub fn columns(&self) -> &'static [ColumnDef] {
        match self {
            Self::Farm => Farm::COLUMNS,
            Self::Surface => Surface::COLUMNS,
            Self::Management => Management::COLUMNS,
            Self::Fertilization => Fertilization::COLUMNS,
            Self::CropProtection => CropProtection::COLUMNS,
            Self::Irrigation => Irrigation::COLUMNS,
            Self::Energy => Energy::COLUMNS,
            Self::Herd => Herd::COLUMNS,
            Self::Effluent => Effluent::COLUMNS,
            Self::Transport => Transport::COLUMNS,
        }
    }
}

/// A persisted row: the record plus the fields the store owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    #[serde(rename = "uuid")]
    pub id: RecordId,
    /// Parent farm; `None` only for farm rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_id: Option<FarmId>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: Record,
}

impl StoredRecord {
    pub fn kind(&self) -> EntityKind {
        self.record.kind()
    }

    /// The form view of this row, with the identifier under `uuid`.
    pub fn to_form(&self) -> FormData {
        let mut form = self.record.to_form();
        form.insert(ID_FORM_KEY.to_string(), self.id.as_str().into());
        form
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Identifier of the written row
    pub id: RecordId,
    /// Farm the row belongs to (the row itself for farms)
    pub farm_id: FarmId,
    pub is_new: bool,
}

/// Everything recorded for one farm: the export/visualization view.
#[derive(Debug, Clone, Serialize)]
pub struct FarmSnapshot {
    pub farm: StoredRecord,
    /// One collection per child kind; every child kind is present.
    pub sections: BTreeMap<EntityKind, Vec<StoredRecord>>,
}

impl FarmSnapshot {
    pub fn farm_id(&self) -> FarmId {
        self.farm.id.clone().into()
    }

    pub fn section(&self, kind: EntityKind) -> &[StoredRecord] {
        if kind.is_root() {
            return std::slice::from_ref(&self.farm);
        }
        self.sections.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(pairs: &[(&str, serde_json::Value)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_every_kind_has_columns_and_unique_form_keys() {
        for kind in EntityKind::ALL {
            let cols = kind.columns();
            assert!(!cols.is_empty(), "{kind} has no columns");
            let mut keys: Vec<_> = cols.iter().map(|c| c.form_key).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), cols.len(), "{kind} repeats a form key");
        }
    }

    #[test]
    fn test_farm_from_form_maps_keys_to_fields() {
        let farm = Farm::from_form(&form(&[
            ("nombre_tambo", json!("La Esperanza")),
            ("ciudad", json!("Rafaela")),
            ("año", json!("2023")),
            ("sup_total", json!(120.5)),
            ("vacas_ordeñe", json!(180)),
            ("venta_industria", json!(60)),
        ]))
        .unwrap();

        assert_eq!(farm.name, "La Esperanza");
        assert_eq!(farm.city, "Rafaela");
        assert_eq!(farm.year, 2023);
        assert_eq!(farm.total_area, 120.5);
        assert_eq!(farm.milking_cows, 180);
        assert_eq!(farm.industry_sales_percentage, 60.0);
        assert_eq!(farm.breed, "");
    }

    #[test]
    fn test_from_form_names_the_bad_field() {
        let err = Record::from_form(
            EntityKind::Herd,
            &form(&[("número_animales", json!("muchos"))]),
        )
        .unwrap_err();
        match err {
            DbError::InvalidField { field, .. } => assert_eq!(field, "número_animales"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_form_round_trip() {
        let herd = Herd {
            category: "Vacas en ordeñe".into(),
            animal_count: 150,
            average_weight: 550.0,
            grazing_hours: 8,
            dry_matter_diet: 18.5,
            pasture_percentage: 60,
            concentrate_percentage: 30,
            others_percentage: 10,
        };
        let record = Record::from(herd.clone());
        let back = Record::from_form(EntityKind::Herd, &record.to_form()).unwrap();
        assert_eq!(back, Record::Herd(herd));
    }

    #[test]
    fn test_record_serializes_with_form_keys() {
        let record = Record::from(Transport {
            origin: "Tambo".into(),
            distance_km: 12.0,
            ..Default::default()
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["inicio"], "Tambo");
        assert_eq!(value["distancia_km"], 12.0);
    }
}
