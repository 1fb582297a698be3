use crate::tcr::TcrErr;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::HashMap;

/// Cell values treated as missing, as written by common table tools.
const MISSING_MARKERS: [&str; 12] = [
    "", "NA", "N/A", "n/a", "<NA>", "NaN", "nan", "-nan", "None", "NULL", "null", "#N/A",
];

/// Whether a table cell holds no value.
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// Converts V/J/C gene names between naming conventions. A `None` result means the gene has no
/// counterpart, and is treated as a missing value.
pub trait GeneConverter {
    fn convert(&self, gene: &str) -> Option<String>;
}

/// Converts 10x Genomics gene names to IMGT gene names, e.g. `TRAV29DV5` to `TRAV29/DV5*01`.
pub struct TenxToImgt {
    tr_gene: Regex,
    dv_fusion: Regex,
}

impl TenxToImgt {
    pub fn new() -> Self {
        TenxToImgt {
            tr_gene: Regex::new(r"^TR[ABGD][VDJC][0-9A-Z/*-]*$").expect("valid regex"),
            // alpha genes which can also recombine as delta, written without the slash by 10x
            dv_fusion: Regex::new(r"^(TRAV[0-9-]+)/?(DV[0-9]+)").expect("valid regex"),
        }
    }
}

impl Default for TenxToImgt {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneConverter for TenxToImgt {
    fn convert(&self, gene: &str) -> Option<String> {
        let gene = gene.trim();
        if is_missing(gene) {
            return None;
        }
        if !self.tr_gene.is_match(gene) {
            debug!("`{gene}` is not a TR gene name");
            return None;
        }

        let mut imgt = self.dv_fusion.replace(gene, "$1/$2").to_string();

        // IMGT names carry an allele; 10x names refer to the first one
        if !imgt.contains('*') {
            imgt.push_str("*01");
        }

        Some(imgt)
    }
}

/// A gene name conversion table, read from a .csv with one column per naming convention.
pub struct LookupTable {
    names: HashMap<String, String>,
}

impl LookupTable {
    /// Reads the table at `path`, mapping names in column `from` to names in column `to`. If a
    /// name appears more than once in `from`, the first row wins.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file cannot be read, or either column is absent.
    pub fn from_path(path: &str, from: &str, to: &str) -> Result<Self> {
        let mut rdr =
            csv::Reader::from_path(path).with_context(|| format!("Unable to open file {path}"))?;

        let headers = rdr.headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            match headers.iter().position(|h| h == name) {
                Some(idx) => Ok(idx),
                None => bail!(TcrErr::MissingColumn {
                    column: name.to_string(),
                    path: path.to_string(),
                }),
            }
        };
        let (from_idx, to_idx) = (column(from)?, column(to)?);

        let mut names = HashMap::new();
        for rec in rdr.records() {
            let rec = rec?;
            let (Some(src), Some(dst)) = (rec.get(from_idx), rec.get(to_idx)) else {
                continue;
            };
            if is_missing(src) || is_missing(dst) {
                continue;
            }
            names
                .entry(src.trim().to_string())
                .or_insert_with(|| dst.trim().to_string());
        }

        info!("Read {} gene names from {path} ({from} to {to})", names.len());
        Ok(LookupTable { names })
    }
}

impl GeneConverter for LookupTable {
    fn convert(&self, gene: &str) -> Option<String> {
        let gene = gene.trim();
        if is_missing(gene) {
            return None;
        }

        let converted = self.names.get(gene).cloned();
        if converted.is_none() {
            debug!("`{gene}` is not in the lookup table");
        }
        converted
    }
}
