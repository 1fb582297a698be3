use bio::io::fasta;
use std::io::Write;

/// The header prefix shared by every record this tool writes.
pub const NAME_PREFIX: &str = "protein|name=";

/// Formats a record and writes it, as a single-line FASTA record named `>protein|name={name}`,
/// to the provided writer.
///
/// # Arguments
///
/// * `writer` - A `bio` FASTA writer wrapping the output file or stream.
/// * `name` - The record name, written after `protein|name=`.
/// * `seq` - The sequence, written on one line.
pub fn write_record<W: Write>(
    writer: &mut fasta::Writer<W>,
    name: &str,
    seq: &str,
) -> std::io::Result<()> {
    writer.write(&format!("{NAME_PREFIX}{name}"), None, seq.as_bytes())
}
