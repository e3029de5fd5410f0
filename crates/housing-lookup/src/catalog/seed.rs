use std::io::Read;
use std::path::Path;

use super::domain::{City, InstitutionSeed};
use super::store::{CatalogError, CatalogStore};

pub const CITIES_FILE: &str = "cities.csv";
pub const INSTITUTIONS_FILE: &str = "institutions.csv";

/// Parse `id,name,department` rows.
pub(crate) fn parse_cities<R: Read>(reader: R) -> Result<Vec<City>, csv::Error> {
    parse_rows(reader)
}

/// Parse `id,name,city_id,kind` rows.
pub(crate) fn parse_institutions<R: Read>(reader: R) -> Result<Vec<InstitutionSeed>, csv::Error> {
    parse_rows(reader)
}

fn parse_rows<R: Read, T: serde::de::DeserializeOwned>(reader: R) -> Result<Vec<T>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<T>().collect()
}

/// Loads a [`CatalogStore`] from CSV seed data.
pub struct CatalogSeed;

impl CatalogSeed {
    pub fn from_readers<C: Read, I: Read>(
        cities: C,
        institutions: I,
    ) -> Result<CatalogStore, CatalogError> {
        let cities = parse_cities(cities)?;
        let institutions = parse_institutions(institutions)?;
        CatalogStore::new(cities, institutions)
    }

    /// Load `cities.csv` and `institutions.csv` from a directory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<CatalogStore, CatalogError> {
        let dir = dir.as_ref();
        let open = |name: &str| {
            let path = dir.join(name);
            std::fs::File::open(&path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })
        };

        Self::from_readers(open(CITIES_FILE)?, open(INSTITUTIONS_FILE)?)
    }
}
