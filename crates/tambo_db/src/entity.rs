//! Entity relationship graph.
//!
//! One root entity (the farm) and nine child sections, each child holding a
//! single foreign key back to the farm. The graph is static: no cycles, no
//! children of children, no cascades.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Foreign-key column every child table carries.
pub const FARM_FK_COLUMN: &str = "farm_id";

/// The kinds of record the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "datos_generales")]
    Farm,
    #[serde(rename = "superficies_insumos")]
    Surface,
    #[serde(rename = "manejo")]
    Management,
    #[serde(rename = "fertilizacion")]
    Fertilization,
    #[serde(rename = "proteccion_cultivos")]
    CropProtection,
    #[serde(rename = "riego")]
    Irrigation,
    #[serde(rename = "energia")]
    Energy,
    #[serde(rename = "rebano")]
    Herd,
    #[serde(rename = "efluentes")]
    Effluent,
    #[serde(rename = "transporte")]
    Transport,
}

/// The association between a child kind and the farm it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub child: EntityKind,
    /// Table holding the child rows
    pub table: &'static str,
    /// Column referencing `farms.id`
    pub foreign_key: &'static str,
    /// Name of the collection on the farm side
    pub farm_collection: &'static str,
}

impl EntityKind {
    /// Every kind, root first, children in section order.
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Farm,
        EntityKind::Surface,
        EntityKind::Management,
        EntityKind::Fertilization,
        EntityKind::CropProtection,
        EntityKind::Irrigation,
        EntityKind::Energy,
        EntityKind::Herd,
        EntityKind::Effluent,
        EntityKind::Transport,
    ];

    /// Child kinds in section order.
    pub const CHILDREN: [EntityKind; 9] = [
        EntityKind::Surface,
        EntityKind::Management,
        EntityKind::Fertilization,
        EntityKind::CropProtection,
        EntityKind::Irrigation,
        EntityKind::Energy,
        EntityKind::Herd,
        EntityKind::Effluent,
        EntityKind::Transport,
    ];

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Farm => "farms",
            Self::Surface => "surfaces",
            Self::Management => "management",
            Self::Fertilization => "fertilization",
            Self::CropProtection => "crop_protection",
            Self::Irrigation => "irrigation",
            Self::Energy => "energy",
            Self::Herd => "herd",
            Self::Effluent => "effluents",
            Self::Transport => "transport",
        }
    }

    /// Name used by the survey forms and flat-file imports.
    pub fn section_key(&self) -> &'static str {
        match self {
            Self::Farm => "datos_generales",
            Self::Surface => "superficies_insumos",
            Self::Management => "manejo",
            Self::Fertilization => "fertilizacion",
            Self::CropProtection => "proteccion_cultivos",
            Self::Irrigation => "riego",
            Self::Energy => "energia",
            Self::Herd => "rebano",
            Self::Effluent => "efluentes",
            Self::Transport => "transporte",
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Farm => "Farm",
            Self::Surface => "Surfaces & inputs",
            Self::Management => "Soil management",
            Self::Fertilization => "Fertilization",
            Self::CropProtection => "Crop protection",
            Self::Irrigation => "Irrigation",
            Self::Energy => "Energy",
            Self::Herd => "Herd",
            Self::Effluent => "Effluents",
            Self::Transport => "Transport",
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Farm)
    }

    /// The child-to-farm association, or `None` for the farm itself.
    pub fn relation(&self) -> Option<Relation> {
        let farm_collection = match self {
            Self::Farm => return None,
            Self::Surface => "surfaces",
            Self::Management => "management",
            Self::Fertilization => "fertilizations",
            Self::CropProtection => "crop_protections",
            Self::Irrigation => "irrigation",
            Self::Energy => "energy",
            Self::Herd => "herd",
            Self::Effluent => "effluents",
            Self::Transport => "transport",
        };
        Some(Relation {
            child: *self,
            table: self.table(),
            foreign_key: FARM_FK_COLUMN,
            farm_collection,
        })
    }

    /// Parse a section key, table name or kind name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|kind| {
            needle == kind.section_key()
                || needle == kind.table()
                || needle == kind.rust_name().to_lowercase()
                || needle == snake_case(kind.rust_name())
        })
    }

    fn rust_name(&self) -> &'static str {
        match self {
            Self::Farm => "Farm",
            Self::Surface => "Surface",
            Self::Management => "Management",
            Self::Fertilization => "Fertilization",
            Self::CropProtection => "CropProtection",
            Self::Irrigation => "Irrigation",
            Self::Energy => "Energy",
            Self::Herd => "Herd",
            Self::Effluent => "Effluent",
            Self::Transport => "Transport",
        }
    }
}

/// Every child relation, in section order.
pub fn relations() -> impl Iterator<Item = Relation> {
    EntityKind::CHILDREN.into_iter().filter_map(|kind| kind.relation())
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.section_key())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|k| k.section_key()).collect();
            format!("Unknown section '{}'. Known sections: {}", s, known.join(", "))
        })
    }
}
