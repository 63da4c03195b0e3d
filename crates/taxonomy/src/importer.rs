//! Sector taxonomy import from CSV.
//!
//! The source file lists one three-level path per row:
//!
//! ```text
//! LAYER1_OID,LAYER_1_TAX_CODE,LAYER1,LAYER2_OID,LAYER_2_TAX_CODE,LAYER2,LAYER3_OID,LAYER_3_TAX_CODE,LAYER3
//! 1000001,A0,"Agriculture, forestry and fishing",1000002,A0.010,Agriculture,1000011,A0.010.090,Animal farming support services
//! ```
//!
//! Each layer becomes a sector keyed by its OID (stored as the correlation
//! id), with the previous layer as its parent. Layers already imported are
//! reused, so repeated rows and shared ancestors create no duplicates.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::models::NewSector;
use crate::store::InMemoryTaxonomyStore;

/// Default name of the sector data file.
pub const SECTORS_FILE: &str = "sectors.csv";

#[derive(Debug, Deserialize)]
struct SectorRow {
    #[serde(rename = "LAYER1_OID")]
    layer1_oid: u64,
    #[serde(rename = "LAYER_1_TAX_CODE")]
    layer1_tax_code: String,
    #[serde(rename = "LAYER1")]
    layer1: String,
    #[serde(rename = "LAYER2_OID")]
    layer2_oid: u64,
    #[serde(rename = "LAYER_2_TAX_CODE")]
    layer2_tax_code: String,
    #[serde(rename = "LAYER2")]
    layer2: String,
    #[serde(rename = "LAYER3_OID")]
    layer3_oid: u64,
    #[serde(rename = "LAYER_3_TAX_CODE")]
    layer3_tax_code: String,
    #[serde(rename = "LAYER3")]
    layer3: String,
}

impl SectorRow {
    fn layers(&self) -> [(u8, u64, &str, &str); 3] {
        [
            (
                1,
                self.layer1_oid,
                self.layer1_tax_code.as_str(),
                self.layer1.as_str(),
            ),
            (
                2,
                self.layer2_oid,
                self.layer2_tax_code.as_str(),
                self.layer2.as_str(),
            ),
            (
                3,
                self.layer3_oid,
                self.layer3_tax_code.as_str(),
                self.layer3.as_str(),
            ),
        ]
    }
}

/// Counts from one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data rows read.
    pub rows: usize,
    /// Sectors created.
    pub created: usize,
    /// Layers that matched an existing sector.
    pub existing: usize,
}

/// Loads sector CSV data into a taxonomy store.
pub struct SectorImporter<'a> {
    store: &'a InMemoryTaxonomyStore,
}

impl<'a> SectorImporter<'a> {
    /// Creates an importer writing into `store`.
    pub fn new(store: &'a InMemoryTaxonomyStore) -> Self {
        Self { store }
    }

    /// Opens `dir/sectors.csv`.
    pub fn open_data_file(dir: impl AsRef<Path>) -> TaxonomyResult<File> {
        open(&dir.as_ref().join(SECTORS_FILE))
    }

    /// Imports the CSV file at `path`.
    pub fn import_path(&self, path: impl AsRef<Path>) -> TaxonomyResult<ImportSummary> {
        let file = open(path.as_ref())?;
        self.import_reader(file)
    }

    /// Imports sector rows from `reader`. The header row is required.
    ///
    /// Stops at the first bad row; sectors from earlier rows stay imported.
    pub fn import_reader<R: Read>(&self, reader: R) -> TaxonomyResult<ImportSummary> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut summary = ImportSummary::default();
        for (index, row) in csv_reader.deserialize::<SectorRow>().enumerate() {
            let row = row?;
            self.import_row(index + 1, &row, &mut summary)?;
            summary.rows += 1;
        }

        tracing::info!(
            rows = summary.rows,
            created = summary.created,
            existing = summary.existing,
            "Imported sectors"
        );
        Ok(summary)
    }

    fn import_row(
        &self,
        row_number: usize,
        row: &SectorRow,
        summary: &mut ImportSummary,
    ) -> TaxonomyResult<()> {
        let mut parent: Option<u64> = None;
        for (layer, oid, tax_code, name) in row.layers() {
            if name.is_empty() {
                return Err(TaxonomyError::MalformedRow {
                    row: row_number,
                    message: format!("blank LAYER{} name for OID {}", layer, oid),
                });
            }

            let public_id = match self.store.find_by_correlation_id(oid) {
                Some(existing) => {
                    summary.existing += 1;
                    existing.public_id
                }
                None => {
                    let mut new = NewSector::named(name).with_correlation_id(oid);
                    new.tax_code = Some(tax_code.to_string()).filter(|c| !c.is_empty());
                    new.layer = Some(layer);
                    if let Some(parent_id) = parent {
                        new = new.with_parent(parent_id);
                    }
                    let sector = self.store.create_sector(new)?;
                    tracing::debug!(oid, public_id = sector.public_id, layer, "Imported sector");
                    summary.created += 1;
                    sector.public_id
                }
            };
            parent = Some(public_id);
        }
        Ok(())
    }
}

fn open(path: &Path) -> TaxonomyResult<File> {
    File::open(path).map_err(|source| TaxonomyError::Io {
        path: PathBuf::from(path),
        source,
    })
}
