use crate::fasta::NAME_PREFIX;
use anyhow::{Context, Result};
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ExtractErr {
    #[error(
        "header on line {line} has no name field:
    `{header}`
expected a header of the form
    >source|name|..."
    )]
    MissingNameField { header: String, line: usize },
}

/// Reduces FASTA-like text (such as alignment tool output) to plain records.
///
/// Every line is trimmed. Blank lines and lines starting with `-` are dropped, headers are
/// rewritten to `>protein|name={name}` using the second `|`-separated field, and all other lines
/// are kept. Every kept line ends with a newline.
pub fn fasta_to_amino_acids(text: &str) -> Result<String, ExtractErr> {
    let mut out = String::with_capacity(text.len());

    for (idx, line) in text.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }

        if line.starts_with('>') {
            let Some(name) = line.split('|').nth(1) else {
                return Err(ExtractErr::MissingNameField {
                    header: line.to_string(),
                    line: idx + 1,
                });
            };
            out.push('>');
            out.push_str(NAME_PREFIX);
            out.push_str(name);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    Ok(out)
}

/// Reads `infile` (or standard input if `None`) and converts it with `fasta_to_amino_acids`.
///
/// Nothing is written here; the caller opens its output only once conversion has succeeded.
pub fn extract_aa(infile: Option<&str>) -> Result<String> {
    let text = match infile {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read file {path}"))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Unable to read standard input")?;
            text
        }
    };

    let records = fasta_to_amino_acids(&text)?;
    debug!("Extracted {} line(s)", records.lines().count());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use indoc::indoc;

    #[test]
    fn headers_are_rewritten() {
        let text = indoc! {"
            >sp|P01308|INS_HUMAN Insulin
            MALWMRLLPL
              LALLALWGPD

            -------------
            >tr|Q2HRD3|ORF6
            PAAAFVNQHL
        "};

        assert_eq!(
            fasta_to_amino_acids(text).unwrap(),
            ">protein|name=P01308\nMALWMRLLPL\nLALLALWGPD\n>protein|name=Q2HRD3\nPAAAFVNQHL\n"
        );
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(fasta_to_amino_acids("").unwrap(), "");
        assert_eq!(fasta_to_amino_acids("\n\n---\n").unwrap(), "");
    }

    #[test]
    fn header_without_name_is_an_error() {
        assert_eq!(
            fasta_to_amino_acids("MKV\n>unnamed\nMKV\n"),
            Err(ExtractErr::MissingNameField {
                header: ">unnamed".to_string(),
                line: 2
            })
        );
    }

    #[test]
    fn file_is_converted() {
        let input = assert_fs::NamedTempFile::new("aln.txt").unwrap();
        input.write_str(">a|TRB|x\nCASSF\n").unwrap();

        let records = extract_aa(Some(input.path().to_str().unwrap())).unwrap();

        assert_eq!(records, ">protein|name=TRB\nCASSF\n");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let missing = dir.child("missing.txt");

        assert!(extract_aa(Some(missing.path().to_str().unwrap())).is_err());
    }
}
