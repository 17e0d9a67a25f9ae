//! Computed farm and herd summaries.

use serde::Serialize;
use std::collections::BTreeSet;
use tambo_db::{EntityKind, Farm, FarmSnapshot, Herd};

/// Headline figures of the general farm data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmSummary {
    pub name: String,
    /// Litres per day
    pub total_daily_production: f64,
    /// Milking cows per hectare of milking-herd area; `None` without area
    pub stocking_rate: Option<f64>,
    /// Declared milk destinations, percent
    pub destinations_total: f64,
}

impl FarmSummary {
    pub fn from_farm(farm: &Farm) -> Self {
        let cows = farm.milking_cows as f64;
        let stocking_rate = if farm.total_cows_area > 0.0 {
            Some(cows / farm.total_cows_area)
        } else {
            None
        };

        Self {
            name: farm.name.clone(),
            total_daily_production: farm.production_per_cow * cows,
            stocking_rate,
            destinations_total: farm.industry_sales_percentage
                + farm.cheese_usage_percentage
                + farm.discard_percentage,
        }
    }
}

/// Diet composition averaged over animals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DietMix {
    pub pasture: f64,
    pub concentrate: f64,
    pub others: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HerdSummary {
    pub total_animals: i64,
    pub categories: usize,
    /// Kilograms
    pub total_live_weight: f64,
    /// Kilograms of dry matter per day
    pub total_dry_matter: f64,
    /// `None` when the herd has no animals
    pub diet: Option<DietMix>,
}

impl HerdSummary {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a Herd>) -> Self {
        let mut total_animals = 0i64;
        let mut categories = BTreeSet::new();
        let mut total_live_weight = 0.0;
        let mut total_dry_matter = 0.0;
        let (mut pasture, mut concentrate, mut others) = (0.0, 0.0, 0.0);

        for herd in rows {
            let count = herd.animal_count as f64;
            total_animals += herd.animal_count;
            categories.insert(herd.category.as_str());
            total_live_weight += count * herd.average_weight;
            total_dry_matter += count * herd.dry_matter_diet;
            pasture += count * herd.pasture_percentage as f64;
            concentrate += count * herd.concentrate_percentage as f64;
            others += count * herd.others_percentage as f64;
        }

        let diet = if total_animals > 0 {
            let n = total_animals as f64;
            Some(DietMix {
                pasture: pasture / n,
                concentrate: concentrate / n,
                others: others / n,
            })
        } else {
            None
        };

        Self {
            total_animals,
            categories: categories.len(),
            total_live_weight,
            total_dry_matter,
            diet,
        }
    }

    pub fn from_snapshot(snapshot: &FarmSnapshot) -> Self {
        Self::from_rows(
            snapshot
                .section(EntityKind::Herd)
                .iter()
                .filter_map(|row| row.record.as_herd()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn herd(category: &str, count: i64, weight: f64, dm: f64, pasture: i64) -> Herd {
        Herd {
            category: category.into(),
            animal_count: count,
            average_weight: weight,
            dry_matter_diet: dm,
            pasture_percentage: pasture,
            concentrate_percentage: 100 - pasture,
            ..Default::default()
        }
    }

    #[test]
    fn test_farm_summary() {
        let farm = Farm {
            name: "La Esperanza".into(),
            production_per_cow: 25.0,
            milking_cows: 200,
            total_cows_area: 100.0,
            industry_sales_percentage: 60.0,
            cheese_usage_percentage: 30.0,
            discard_percentage: 10.0,
            ..Default::default()
        };
        let summary = FarmSummary::from_farm(&farm);
        assert_eq!(summary.total_daily_production, 5000.0);
        assert_eq!(summary.stocking_rate, Some(2.0));
        assert_eq!(summary.destinations_total, 100.0);

        let no_area = Farm::default();
        assert_eq!(FarmSummary::from_farm(&no_area).stocking_rate, None);
    }

    #[test]
    fn test_herd_summary_weights_by_head_count() {
        let rows = [
            herd("Vacas en ordeñe", 100, 600.0, 20.0, 50),
            herd("Vacas secas", 50, 550.0, 12.0, 80),
            herd("Vacas en ordeñe", 10, 600.0, 20.0, 50),
        ];
        let summary = HerdSummary::from_rows(&rows);

        assert_eq!(summary.total_animals, 160);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.total_live_weight, 60_000.0 + 27_500.0 + 6_000.0);
        assert_eq!(summary.total_dry_matter, 2_000.0 + 600.0 + 200.0);

        let diet = summary.diet.unwrap();
        assert_eq!(diet.pasture, (5_000.0 + 4_000.0 + 500.0) / 160.0);
        assert_eq!(diet.others, 0.0);
    }

    #[test]
    fn test_empty_herd() {
        let summary = HerdSummary::from_rows(&Vec::<Herd>::new());
        assert_eq!(summary.total_animals, 0);
        assert_eq!(summary.diet, None);
    }
}
