use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// The column of NetMHCpan output holding the eluted-ligand percentile rank.
pub const RANK_COLUMN: &str = "EL_Rank";

/// Ranks at or below this are strong binders.
pub const STRONG_RANK: f64 = 0.5;

/// Ranks at or below this (and above `STRONG_RANK`) are weak binders.
pub const WEAK_RANK: f64 = 2.0;

/// Separates the ORF from the allele in NetMHCpan output file names.
const ALLELE_MARKER: &str = "_HLA-";

/// Binding strength of a peptide, as conventionally reported by NetMHCpan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderClass {
    Strong,
    Weak,
    NonBinder,
}

impl BinderClass {
    /// Classifies an EL_Rank. Both thresholds are inclusive.
    pub fn from_rank(rank: f64) -> Self {
        if rank <= STRONG_RANK {
            BinderClass::Strong
        } else if rank <= WEAK_RANK {
            BinderClass::Weak
        } else {
            BinderClass::NonBinder
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinderClass::Strong => "SB",
            BinderClass::Weak => "WB",
            BinderClass::NonBinder => "NB",
        }
    }
}

impl std::fmt::Display for BinderClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum NetMhcErr {
    #[error(
        "could not find the ORF and allele in the file name `{name}`
expected a name of the form
    {{orf}}_HLA-{{allele}}_....xls"
    )]
    UnrecognisedFileName { name: String },

    #[error("no `EL_Rank` column in the header of {path}")]
    MissingRankColumn { path: String },

    #[error(
        "invalid EL_Rank on line {line}:
    `{value}`
is not a number"
    )]
    InvalidRank { value: String, line: u64 },
}

/// The ORF and allele which a NetMHCpan output file was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLabels {
    pub orf: String,
    pub allele: String,
}

impl FileLabels {
    /// Parses the labels from a path such as `ORF6_Q2HRD3_HLA-A02:01_netmhc.xls`, giving an ORF
    /// of `ORF6_Q2HRD3` and an allele of `A02:01`.
    pub fn from_path(path: &str) -> Result<Self, NetMhcErr> {
        let stem = Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some((orf, rest)) = stem.split_once(ALLELE_MARKER) else {
            return Err(NetMhcErr::UnrecognisedFileName { name: stem });
        };
        let allele = rest.split('_').next().unwrap_or(rest);

        Ok(FileLabels {
            orf: orf.to_string(),
            allele: allele.to_string(),
        })
    }

    /// The default output file name, `{orf}_{allele}_filtered_netmhc.csv` with `:` replaced.
    pub fn output_name(&self) -> String {
        format!(
            "{}_{}_filtered_netmhc.csv",
            self.orf,
            self.allele.replace(':', "_")
        )
    }
}

/// NetMHCpan rows which passed the binding threshold, with the annotation columns appended.
#[derive(Debug)]
pub struct FilteredTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

/// Reads a NetMHCpan .xls file, classifies every row by EL_Rank, and keeps the rows whose rank
/// is at or below `binding_threshold`.
///
/// The classification does not depend on `binding_threshold`, so with a permissive threshold
/// rows labelled `NB` are kept.
///
/// # Arguments
///
/// * `xls` - The NetMHCpan output. Its first line is a title line and is skipped.
/// * `binding_threshold` - The maximum EL_Rank to keep.
/// * `labels` - The ORF and allele added to every row.
///
/// # Errors
///
/// This function will return an error if the file cannot be read, if it has no `EL_Rank` column,
/// or if a rank is not a number.
pub fn format_netmhc_output(
    xls: &str,
    binding_threshold: f64,
    labels: &FileLabels,
) -> Result<FilteredTable> {
    let file = File::open(xls).with_context(|| format!("Unable to open file {xls}"))?;
    let mut file = BufReader::new(file);

    // read the first line, which is NOT in tabular format
    let mut title = String::new();
    file.read_line(&mut title)
        .context("Could not read the first line")?;
    debug!("Skipping title line: {}", title.trim());

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut headers = rdr.headers()?.clone();
    let Some(rank_idx) = headers.iter().position(|h| h.trim() == RANK_COLUMN) else {
        bail!(NetMhcErr::MissingRankColumn {
            path: xls.to_string()
        });
    };
    headers.push_field("binder");
    headers.push_field("orf");
    headers.push_field("allele");

    let mut rows = Vec::new();
    let mut total = 0usize;
    for rec in rdr.records() {
        let mut rec = rec?;
        total += 1;

        // the title line is not seen by the csv reader
        let line = rec.position().map_or(0, |p| p.line() + 1);
        let value = rec.get(rank_idx).unwrap_or_default().trim();
        let rank: f64 = value.parse().map_err(|_| NetMhcErr::InvalidRank {
            value: value.to_string(),
            line,
        })?;

        if rank > binding_threshold {
            continue;
        }

        rec.push_field(BinderClass::from_rank(rank).as_str());
        rec.push_field(&labels.orf);
        rec.push_field(&labels.allele);
        rows.push(rec);
    }

    info!(
        "Kept {} of {} rows with {RANK_COLUMN} <= {binding_threshold}",
        rows.len(),
        total
    );

    Ok(FilteredTable { headers, rows })
}

/// Filters a NetMHCpan .xls file and writes the annotated rows as a .csv.
///
/// The output is written to `out` if given, and otherwise to the name computed by
/// `FileLabels::output_name` in the working directory.
///
/// # Returns
///
/// The path which was written.
pub fn netmhcpan(xls: &str, binding_threshold: f64, out: Option<&str>) -> Result<String> {
    let labels = FileLabels::from_path(xls)?;
    let table = format_netmhc_output(xls, binding_threshold, &labels)?;

    let output = match out {
        Some(path) => path.to_string(),
        None => labels.output_name(),
    };

    let mut wtr =
        csv::Writer::from_path(&output).with_context(|| format!("Unable to create file {output}"))?;
    wtr.write_record(&table.headers)?;
    for row in table.rows.iter() {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    info!("Wrote {} filtered rows to {output}", table.rows.len());
    Ok(output)
}
