use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Removed from the second file name when naming the output, e.g. `2_tcr_fasta.fa` gives `2_tcr`.
const FASTA_TOKEN: &str = "_fasta";

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Computes the output name for a concatenation, `{stem1}_{stem2}_chai.fasta`, where `_fasta` is
/// removed from the second stem.
///
/// # Example
///
/// ```
/// let name = default_output_name("ORF6_Q2HRD3_0_SB_B15_10.fasta", "2_tcr_fasta.fa");
/// assert_eq!(name, "ORF6_Q2HRD3_0_SB_B15_10_2_tcr_chai.fasta");
/// ```
pub fn default_output_name(file1: &str, file2: &str) -> String {
    format!(
        "{}_{}_chai.fasta",
        file_stem(file1),
        file_stem(file2).replace(FASTA_TOKEN, "")
    )
}

/// Writes the contents of `file1`, a newline, and then the contents of `file2` to `output`, or to
/// `default_output_name` in the working directory if no output is given.
///
/// Both inputs are read before the output is created, so a missing input leaves nothing behind.
///
/// # Returns
///
/// The path which was written.
pub fn concat(file1: &str, file2: &str, output: Option<&str>) -> Result<String> {
    let first = std::fs::read(file1).with_context(|| format!("Unable to read file {file1}"))?;
    let second = std::fs::read(file2).with_context(|| format!("Unable to read file {file2}"))?;

    let output = match output {
        Some(path) => path.to_string(),
        None => default_output_name(file1, file2),
    };

    let file = File::create(&output).with_context(|| format!("Unable to create file {output}"))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&first)?;
    writer.write_all(b"\n")?;
    writer.write_all(&second)?;
    writer.flush()?;

    info!("Concatenated file written to: {output}");
    Ok(output)
}
