use crate::gene::{is_missing, GeneConverter};
use anyhow::{bail, Context, Result};
use csv::StringRecord;
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

const ID: &str = "ID";
const BETA_COLUMNS: [&str; 4] = ["TRBV", "TRBJ", "TRBC", "TRB_CDR3"];
const ALPHA_COLUMNS: [&str; 3] = ["TRAV", "TRAJ", "TRA_CDR3"];

/// The header of the reformatted table.
pub const OUTPUT_COLUMNS: [&str; 8] = ["ID", "BV", "BJ", "BC", "BCDR3", "AV", "AJ", "ACDR3"];

#[derive(Error, Debug)]
pub enum TcrErr {
    #[error("no `{column}` column in the header of {path}")]
    MissingColumn { column: String, path: String },
}

/// One chain of a TCR, with gene names already converted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainRow {
    pub id: Option<String>,
    pub v_gene: Option<String>,
    pub j_gene: Option<String>,
    pub c_gene: Option<String>,
    pub cdr3: Option<String>,
}

/// A complete paired TCR, as written to the output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedTcr {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "BV")]
    pub beta_v: String,
    #[serde(rename = "BJ")]
    pub beta_j: String,
    #[serde(rename = "BC")]
    pub beta_c: String,
    #[serde(rename = "BCDR3")]
    pub beta_cdr3: String,
    #[serde(rename = "AV")]
    pub alpha_v: String,
    #[serde(rename = "AJ")]
    pub alpha_j: String,
    #[serde(rename = "ACDR3")]
    pub alpha_cdr3: String,
}

impl PairedTcr {
    /// Combines a beta and an alpha chain. Returns `None` if any field of either is missing.
    pub fn from_chains(beta: &ChainRow, alpha: &ChainRow) -> Option<Self> {
        Some(PairedTcr {
            id: beta.id.clone()?,
            beta_v: beta.v_gene.clone()?,
            beta_j: beta.j_gene.clone()?,
            beta_c: beta.c_gene.clone()?,
            beta_cdr3: beta.cdr3.clone()?,
            alpha_v: alpha.v_gene.clone()?,
            alpha_j: alpha.j_gene.clone()?,
            alpha_cdr3: alpha.cdr3.clone()?,
        })
    }
}

/// Beta and alpha chains of a wide TCR table, projected into the shared v/j/c/cdr3 layout.
#[derive(Debug, Default)]
pub struct ChainTables {
    pub beta: Vec<ChainRow>,
    pub alpha: Vec<ChainRow>,
}

fn cell(rec: &StringRecord, idx: usize) -> Option<String> {
    rec.get(idx)
        .filter(|v| !is_missing(v))
        .map(|v| v.trim().to_string())
}

/// Reads a wide TCR table and splits it into beta and alpha chains, converting the V, J and C
/// gene names with `converter`. CDR3 sequences are passed through.
///
/// # Errors
///
/// This function will return an error if the file cannot be read or a required column is absent.
pub fn split_chains(input: &str, converter: &dyn GeneConverter) -> Result<ChainTables> {
    let mut rdr =
        csv::Reader::from_path(input).with_context(|| format!("Unable to open file {input}"))?;

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        match headers.iter().position(|h| h == name) {
            Some(idx) => Ok(idx),
            None => bail!(TcrErr::MissingColumn {
                column: name.to_string(),
                path: input.to_string(),
            }),
        }
    };

    let id = column(ID)?;
    let [bv, bj, bc, bcdr3] = BETA_COLUMNS.map(column);
    let (bv, bj, bc, bcdr3) = (bv?, bj?, bc?, bcdr3?);
    let [av, aj, acdr3] = ALPHA_COLUMNS.map(column);
    let (av, aj, acdr3) = (av?, aj?, acdr3?);

    let gene = |rec: &StringRecord, idx: usize| -> Option<String> {
        cell(rec, idx).and_then(|g| converter.convert(&g))
    };

    let mut tables = ChainTables::default();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("Invalid row in {input}"))?;

        tables.beta.push(ChainRow {
            id: cell(&rec, id),
            v_gene: gene(&rec, bv),
            j_gene: gene(&rec, bj),
            c_gene: gene(&rec, bc),
            cdr3: cell(&rec, bcdr3),
        });
        tables.alpha.push(ChainRow {
            id: cell(&rec, id),
            v_gene: gene(&rec, av),
            j_gene: gene(&rec, aj),
            c_gene: None,
            cdr3: cell(&rec, acdr3),
        });
    }

    info!("Read {} TCRs from {input}", tables.beta.len());
    Ok(tables)
}

/// Inner-joins beta and alpha chains on their ID, dropping pairs with any missing field.
///
/// Output follows the order of `beta`. An ID which occurs several times in both tables produces
/// every beta/alpha combination.
pub fn join_chains(tables: &ChainTables) -> Vec<PairedTcr> {
    let mut alpha_by_id: IndexMap<&str, Vec<&ChainRow>> = IndexMap::new();
    for alpha in tables.alpha.iter() {
        if let Some(id) = alpha.id.as_deref() {
            alpha_by_id.entry(id).or_default().push(alpha);
        }
    }

    let mut joined = 0usize;
    let mut paired = Vec::new();
    for beta in tables.beta.iter() {
        let Some(alphas) = beta.id.as_deref().and_then(|id| alpha_by_id.get(id)) else {
            continue;
        };

        for alpha in alphas.iter() {
            joined += 1;
            if let Some(tcr) = PairedTcr::from_chains(beta, alpha) {
                paired.push(tcr);
            }
        }
    }

    if joined > paired.len() {
        warn!(
            "Dropped {} paired TCR(s) with a missing or unconvertible field",
            joined - paired.len()
        );
    }

    paired
}

/// Reformats a wide TCR table into paired, converted gene names and writes it as a .csv with
/// the columns of `OUTPUT_COLUMNS`.
///
/// # Returns
///
/// The number of TCRs written.
pub fn format_tcr(input: &str, output: &str, converter: &dyn GeneConverter) -> Result<usize> {
    let tables = split_chains(input, converter)?;
    let paired = join_chains(&tables);

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output)
        .with_context(|| format!("Unable to create file {output}"))?;

    // written by hand so that an empty table still has a header
    wtr.write_record(OUTPUT_COLUMNS)?;
    for tcr in paired.iter() {
        wtr.serialize(tcr)?;
    }
    wtr.flush()?;

    info!("Wrote {} paired TCRs to {output}", paired.len());
    Ok(paired.len())
}
