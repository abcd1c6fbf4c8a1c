use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context};

use super::{Record, Table, Value};

impl Table {
    /// Reads a table from CSV text with a header row.
    ///
    /// Unnamed header cells (as written by R's `write.csv` for row names)
    /// are called `(Column i)`. Every row must have as many fields as the
    /// header.
    pub fn from_csv_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Vec<String> = csv_reader
            .headers()
            .context("No CSV header in input")?
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if name.is_empty() {
                    format!("(Column {})", i)
                } else {
                    name.to_string()
                }
            })
            .collect();

        if header.is_empty() {
            bail!("CSV header has no columns");
        }

        let mut table = Table::new(&header);
        for (ix_rec, row_record) in csv_reader.records().enumerate() {
            let row = row_record.with_context(|| format!("Error parsing CSV record (line {})", ix_rec + 2))?;
            if row.len() != header.len() {
                return Err(anyhow!(
                    "Record on line {} has {} fields, header has {}",
                    ix_rec + 2,
                    row.len(),
                    header.len()
                ));
            }
            let record: Record = header
                .iter()
                .zip(row.iter())
                .map(|(name, entry)| (name.clone(), Value::parse(entry)))
                .collect();
            table.push(record);
        }

        log::debug!(
            "loaded {} records with {} columns",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Unable to open {}", path.display()))?;
        Self::from_csv_reader(file).with_context(|| format!("Unable to read {}", path.display()))
    }
}
