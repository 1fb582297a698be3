use crate::allele::AlleleNormalizer;
use crate::fasta::write_record;
use crate::reference::HlaReference;
use anyhow::{bail, Context, Result};
use bio::io::fasta;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single peptide-HLA pairing from the input table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PeptideRow {
    #[serde(rename = "Peptide")]
    pub peptide: String,
    /// Position of the peptide within its ORF. Kept as text so it is reproduced verbatim.
    #[serde(rename = "Pos")]
    pub pos: String,
    pub orf: String,
    pub binder: String,
    pub allele: String,
}

impl PeptideRow {
    /// The `{orf}_{pos}_{binder}` identifier used to name the peptide record.
    pub fn peptide_id(&self) -> String {
        format!("{}_{}_{}", self.orf, self.pos, self.binder)
    }

    /// The output file name for this row, `{peptide_id}_{allele}.fasta` with `:` replaced.
    pub fn file_name(&self) -> String {
        format!("{}_{}.fasta", self.peptide_id(), self.allele.replace(':', "_"))
    }
}

#[derive(Error, Debug)]
pub enum LookupErr {
    #[error(
        "allele '{allele}' not found in FASTA files from {dir}
(requested as '{raw}' on line {line} of the input table)"
    )]
    AlleleNotFound {
        allele: String,
        raw: String,
        dir: String,
        line: usize,
    },
}

/// Writes a two-record FASTA (peptide, then HLA sequence) for every row of the input table.
///
/// Rows are processed in order. If an allele cannot be found, processing stops immediately and
/// an error is returned; the files for earlier rows have already been written and are left in
/// place.
///
/// # Arguments
///
/// * `hla_dir` - The directory of IMGT/HLA protein FASTA files.
/// * `input` - The peptide table (.csv).
/// * `outdir` - The directory in which to write the output files.
/// * `suffix` - Only files in `hla_dir` ending with this are read.
///
/// # Returns
///
/// The paths of the files which were written.
pub fn lookup_hla(hla_dir: &str, input: &str, outdir: &str, suffix: &str) -> Result<Vec<PathBuf>> {
    let reference = HlaReference::from_dir(hla_dir, suffix)?;
    let normalizer = AlleleNormalizer::new();

    let mut rdr = csv::Reader::from_path(input)
        .with_context(|| format!("Unable to open file {input}"))?;

    let mut written = Vec::new();
    for (idx, row) in rdr.deserialize().enumerate() {
        let row: PeptideRow = row.with_context(|| format!("Invalid row in {input}"))?;

        let allele = normalizer.normalize(&row.allele);
        let Some(sequence) = reference.get(&allele) else {
            bail!(LookupErr::AlleleNotFound {
                allele,
                raw: row.allele,
                dir: hla_dir.to_string(),
                // 1-based, after the header line
                line: idx + 2,
            });
        };

        let path = write_pair(&row, sequence, Path::new(outdir))?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    info!("Wrote {} peptide-HLA FASTA file(s) to {outdir}", written.len());
    Ok(written)
}

/// Writes the peptide of `row` followed by its HLA `sequence` to a new file in `outdir`.
/// The HLA record is named after the allele exactly as it appears in the input table.
pub fn write_pair(row: &PeptideRow, sequence: &str, outdir: &Path) -> Result<PathBuf> {
    let path = outdir.join(row.file_name());
    let mut writer = fasta::Writer::to_file(&path)
        .with_context(|| format!("Unable to create file {}", path.display()))?;

    write_record(&mut writer, &row.peptide_id(), &row.peptide)?;
    write_record(&mut writer, &row.allele, sequence)?;
    writer.flush()?;

    Ok(path)
}
