use serde::{Deserialize, Serialize};

use crate::lookup::Candidate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub name: String,
    pub department: String,
}

impl From<&City> for Candidate {
    fn from(city: &City) -> Self {
        Candidate::new(city.id, city.name.clone()).with_parent(city.department.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionKind {
    University,
    TechnicalSchool,
    LanguageSchool,
    Other,
}

impl InstitutionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::University => "University",
            Self::TechnicalSchool => "Technical School",
            Self::LanguageSchool => "Language School",
            Self::Other => "Other",
        }
    }
}

/// Institution as served to clients, with its city's display name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: u32,
    pub name: String,
    pub city_id: u32,
    pub city_name: String,
    pub kind: InstitutionKind,
}

impl From<&Institution> for Candidate {
    fn from(institution: &Institution) -> Self {
        Candidate::new(institution.id, institution.name.clone())
            .with_parent(institution.city_name.clone())
    }
}

/// Institution as stored in seed data, before its city is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstitutionSeed {
    pub id: u32,
    pub name: String,
    pub city_id: u32,
    pub kind: InstitutionKind,
}
