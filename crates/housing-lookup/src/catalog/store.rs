use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::domain::{City, Institution, InstitutionKind, InstitutionSeed};
use super::normalizer::{fold, rank, MatchRank};
use crate::lookup::{Candidate, CandidateSource, LookupQuery, SourceError};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("search text must not be blank")]
    EmptyQuery,
    #[error("city {0} does not exist")]
    UnknownCity(u32),
    #[error("city id {0} appears more than once")]
    DuplicateCity(u32),
    #[error("institution id {0} appears more than once")]
    DuplicateInstitution(u32),
    #[error("institution {institution} references missing city {city}")]
    OrphanInstitution { institution: u32, city: u32 },
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read catalog seed {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
struct Indexed<T> {
    record: T,
    folded: String,
}

/// In-memory city and institution catalog with accent-insensitive search.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    cities: Vec<Indexed<City>>,
    institutions: Vec<Indexed<Institution>>,
}

impl CatalogStore {
    /// Build a catalog from seed records, rejecting duplicate ids and dangling city references.
    pub fn new(
        cities: Vec<City>,
        institutions: Vec<InstitutionSeed>,
    ) -> Result<Self, CatalogError> {
        let mut city_ids = HashSet::new();
        for city in &cities {
            if !city_ids.insert(city.id) {
                return Err(CatalogError::DuplicateCity(city.id));
            }
        }

        let mut institution_ids = HashSet::new();
        for seed in &institutions {
            if !institution_ids.insert(seed.id) {
                return Err(CatalogError::DuplicateInstitution(seed.id));
            }
            if !city_ids.contains(&seed.city_id) {
                return Err(CatalogError::OrphanInstitution {
                    institution: seed.id,
                    city: seed.city_id,
                });
            }
        }

        Ok(Self::assemble(cities, institutions))
    }

    /// Small catalog of Colombian university cities used by demos and local runs.
    pub fn builtin() -> Self {
        let cities = [
            (11001, "Bogotá", "Bogotá D.C."),
            (5001, "Medellín", "Antioquia"),
            (76001, "Cali", "Valle del Cauca"),
            (8001, "Barranquilla", "Atlántico"),
            (13001, "Cartagena de Indias", "Bolívar"),
            (68001, "Bucaramanga", "Santander"),
            (17001, "Manizales", "Caldas"),
            (66001, "Pereira", "Risaralda"),
            (15001, "Tunja", "Boyacá"),
            (19001, "Popayán", "Cauca"),
            (47001, "Santa Marta", "Magdalena"),
            (5266, "Envigado", "Antioquia"),
        ]
        .into_iter()
        .map(|(id, name, department)| City {
            id,
            name: name.to_string(),
            department: department.to_string(),
        })
        .collect();

        let institutions = [
            (1, "Universidad Nacional de Colombia", 11001, InstitutionKind::University),
            (2, "Pontificia Universidad Javeriana", 11001, InstitutionKind::University),
            (3, "Universidad de los Andes", 11001, InstitutionKind::University),
            (4, "Universidad del Rosario", 11001, InstitutionKind::University),
            (5, "Universidad de Antioquia", 5001, InstitutionKind::University),
            (6, "Universidad EAFIT", 5001, InstitutionKind::University),
            (
                7,
                "Universidad Nacional de Colombia - Sede Medellín",
                5001,
                InstitutionKind::University,
            ),
            (
                8,
                "Servicio Nacional de Aprendizaje SENA Medellín",
                5001,
                InstitutionKind::TechnicalSchool,
            ),
            (9, "Universidad del Valle", 76001, InstitutionKind::University),
            (10, "Pontificia Universidad Javeriana Cali", 76001, InstitutionKind::University),
            (11, "Universidad del Norte", 8001, InstitutionKind::University),
            (12, "Universidad de Cartagena", 13001, InstitutionKind::University),
            (13, "Universidad Industrial de Santander", 68001, InstitutionKind::University),
            (14, "Universidad de Caldas", 17001, InstitutionKind::University),
            (15, "Universidad Tecnológica de Pereira", 66001, InstitutionKind::University),
            (
                16,
                "Universidad Pedagógica y Tecnológica de Colombia",
                15001,
                InstitutionKind::University,
            ),
            (17, "Universidad del Cauca", 19001, InstitutionKind::University),
            (18, "Universidad del Magdalena", 47001, InstitutionKind::University),
            (19, "Escuela de Idiomas EAFIT", 5001, InstitutionKind::LanguageSchool),
            (20, "Institución Universitaria de Envigado", 5266, InstitutionKind::University),
        ]
        .into_iter()
        .map(|(id, name, city_id, kind)| InstitutionSeed {
            id,
            name: name.to_string(),
            city_id,
            kind,
        })
        .collect();

        Self::assemble(cities, institutions)
    }

    fn assemble(cities: Vec<City>, institutions: Vec<InstitutionSeed>) -> Self {
        let city_names: HashMap<u32, String> = cities
            .iter()
            .map(|city| (city.id, city.name.clone()))
            .collect();

        let institutions = institutions
            .into_iter()
            .filter_map(|seed| {
                let city_name = city_names.get(&seed.city_id)?.clone();
                Some(Indexed {
                    folded: fold(&seed.name),
                    record: Institution {
                        id: seed.id,
                        name: seed.name,
                        city_id: seed.city_id,
                        city_name,
                        kind: seed.kind,
                    },
                })
            })
            .collect();

        let cities = cities
            .into_iter()
            .map(|city| Indexed {
                folded: fold(&city.name),
                record: city,
            })
            .collect();

        Self {
            cities,
            institutions,
        }
    }

    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    pub fn institution_count(&self) -> usize {
        self.institutions.len()
    }

    pub fn city(&self, id: u32) -> Option<&City> {
        self.cities
            .iter()
            .map(|entry| &entry.record)
            .find(|city| city.id == id)
    }

    pub fn search_cities(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<City>, CatalogError> {
        let query = folded_query(query)?;
        Ok(ranked(&self.cities, &query, |_| true, limit))
    }

    /// Search institutions, optionally restricted to one city.
    pub fn search_institutions(
        &self,
        query: &str,
        city_id: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Institution>, CatalogError> {
        let query = folded_query(query)?;
        if let Some(city_id) = city_id {
            if self.city(city_id).is_none() {
                return Err(CatalogError::UnknownCity(city_id));
            }
        }

        Ok(ranked(
            &self.institutions,
            &query,
            |institution| city_id.map_or(true, |id| institution.city_id == id),
            limit,
        ))
    }
}

fn folded_query(query: &str) -> Result<String, CatalogError> {
    let folded = fold(query);
    if folded.is_empty() {
        Err(CatalogError::EmptyQuery)
    } else {
        Ok(folded)
    }
}

fn ranked<T: Clone>(
    entries: &[Indexed<T>],
    query: &str,
    keep: impl Fn(&T) -> bool,
    limit: Option<usize>,
) -> Vec<T> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut matches: Vec<(MatchRank, &Indexed<T>)> = entries
        .iter()
        .filter(|entry| keep(&entry.record))
        .filter_map(|entry| rank(&entry.folded, query).map(|rank| (rank, entry)))
        .collect();
    matches.sort_by(|(left_rank, left), (right_rank, right)| {
        left_rank
            .cmp(right_rank)
            .then_with(|| left.folded.cmp(&right.folded))
    });

    matches
        .into_iter()
        .take(limit)
        .map(|(_, entry)| entry.record.clone())
        .collect()
}

/// Which catalog collection a [`CatalogSource`] searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    City,
    Institution,
}

impl CatalogKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Institution => "institution",
        }
    }
}

/// In-process [`CandidateSource`] over a shared catalog.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    store: std::sync::Arc<CatalogStore>,
    kind: CatalogKind,
}

impl CatalogSource {
    pub fn new(store: std::sync::Arc<CatalogStore>, kind: CatalogKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl CandidateSource for CatalogSource {
    async fn search(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError> {
        let found = match self.kind {
            CatalogKind::City => self
                .store
                .search_cities(&query.text, None)
                .map(|cities| cities.iter().map(Candidate::from).collect()),
            CatalogKind::Institution => {
                let scope = query.scope.as_ref().ok_or(SourceError::MissingScope)?;
                let city_id = scope.as_str().parse::<u32>().map_err(|_| {
                    SourceError::Status {
                        status: 400,
                        body: format!("invalid city scope '{}'", scope.as_str()),
                    }
                })?;
                self.store
                    .search_institutions(&query.text, Some(city_id), None)
                    .map(|institutions| institutions.iter().map(Candidate::from).collect())
            }
        };

        found.map_err(|err| SourceError::Status {
            status: 400,
            body: err.to_string(),
        })
    }
}
