use crate::allele::{four_digit, strip_annotation};
use anyhow::{Context, Result};
use bio::io::fasta;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Reference protein sequences from IMGT/HLA, keyed by four-digit allele (e.g. `A*01:01`).
///
/// Only the first sequence seen for each four-digit allele is kept. IMGT orders alleles
/// numerically within each file, so this is the sequence of the lowest-numbered full allele.
#[derive(Debug, Default)]
pub struct HlaReference {
    alleles: IndexMap<String, String>,
}

impl HlaReference {
    /// Reads every file in `dir` whose name ends in `suffix`, in file name order.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The directory cannot be listed.
    /// * A matching file cannot be opened, or is not valid FASTA.
    /// * A sequence is not valid UTF-8.
    pub fn from_dir(dir: &str, suffix: &str) -> Result<Self> {
        let mut paths = std::fs::read_dir(dir)
            .with_context(|| format!("Unable to read HLA directory {dir}"))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<PathBuf>>>()?;

        paths.retain(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(suffix))
        });
        paths.sort();

        let mut reference = HlaReference::default();
        for path in paths.iter() {
            reference.read_file(path)?;
        }

        if reference.is_empty() {
            warn!("No alleles found in {dir} (files ending with `{suffix}`)");
        } else {
            info!(
                "Read {} four-digit alleles from {} file(s) in {dir}",
                reference.len(),
                paths.len()
            );
        }

        Ok(reference)
    }

    /// Adds the records of a single FASTA file, keeping existing alleles.
    fn read_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading {}", path.display());

        let reader = fasta::Reader::from_file(path)
            .with_context(|| format!("Unable to open file {}", path.display()))?;

        for rec in reader.records() {
            let rec = rec.with_context(|| format!("Invalid FASTA in {}", path.display()))?;

            // headers look like `>HLA:HLA00001 A*01:01:01:01 365 bp`
            let Some(allele) = rec.desc().and_then(|d| d.split_whitespace().next()) else {
                debug!("Skipping header without an allele: `{}`", rec.id());
                continue;
            };

            let key = four_digit(allele);
            if self.alleles.contains_key(key) {
                continue;
            }

            let seq = String::from_utf8(rec.seq().to_vec())
                .with_context(|| format!("Sequence for {allele} is not valid UTF-8"))?;
            self.alleles.insert(key.to_string(), seq);
        }

        Ok(())
    }

    /// Looks up an allele, ignoring anything after a `;`.
    pub fn get(&self, value: &str) -> Option<&str> {
        self.alleles.get(strip_annotation(value)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use indoc::indoc;

    fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> HlaReference {
        let mut reference = HlaReference::default();
        for (allele, seq) in pairs {
            reference
                .alleles
                .entry(four_digit(allele).to_string())
                .or_insert_with(|| seq.to_string());
        }
        reference
    }

    #[test]
    fn first_record_wins() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A_prot.fasta")
            .write_str(indoc! {"
                >HLA:HLA00001 A*01:01:01:01 365 bp
                MAVMAPRTLL
                LLLSGALALT
                >HLA:HLA00002 A*01:01:01:02N 365 bp
                XXXXXXXXXX
                >HLA:HLA00003 A*01:02 365 bp
                MAVMAPRTLV
            "})
            .unwrap();

        let reference = HlaReference::from_dir(dir.path().to_str().unwrap(), "_prot.fasta").unwrap();

        assert_eq!(reference.len(), 2);
        assert_eq!(reference.get("A*01:01"), Some("MAVMAPRTLLLLLSGALALT"));
        assert_eq!(reference.get("A*01:02"), Some("MAVMAPRTLV"));
    }

    #[test]
    fn files_are_read_in_name_order() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("b_prot.fasta")
            .write_str(">HLA:HLA2 B*07:02:01 1 bp\nSECOND\n")
            .unwrap();
        dir.child("a_prot.fasta")
            .write_str(">HLA:HLA1 B*07:02:02 1 bp\nFIRST\n")
            .unwrap();

        let reference = HlaReference::from_dir(dir.path().to_str().unwrap(), "_prot.fasta").unwrap();

        assert_eq!(reference.get("B*07:02"), Some("FIRST"));
        assert_eq!(reference.len(), 1);
    }

    #[test]
    fn only_matching_files_are_read() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A_nuc.fasta")
            .write_str(">HLA:HLA1 A*02:01:01:01 1 bp\nATG\n")
            .unwrap();
        dir.child("notes.txt").write_str("not fasta at all").unwrap();

        let reference = HlaReference::from_dir(dir.path().to_str().unwrap(), "_prot.fasta").unwrap();

        assert!(reference.is_empty());
        assert_eq!(reference.get("A*02:01"), None);
    }

    #[test]
    fn headers_without_allele_are_skipped() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("C_prot.fasta")
            .write_str(indoc! {"
                >HLA:HLA00401
                SKIPPED
                >HLA:HLA00402 C*01:02:01 366 bp
                KEPT
            "})
            .unwrap();

        let reference = HlaReference::from_dir(dir.path().to_str().unwrap(), "_prot.fasta").unwrap();

        assert_eq!(reference.len(), 1);
        assert_eq!(reference.get("C*01:02"), Some("KEPT"));
    }

    #[test]
    fn sequence_under_skipped_header_is_not_appended() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A_prot.fasta")
            .write_str(">HLA:1 A*01:01:01:01\nAAA\n>HLA:2\nBBB\n")
            .unwrap();

        let reference = HlaReference::from_dir(dir.path().to_str().unwrap(), "_prot.fasta").unwrap();

        assert_eq!(reference.len(), 1);
        assert_eq!(reference.get("A*01:01"), Some("AAA"));
    }

    #[test]
    fn lookup_ignores_annotation() {
        let reference = from_pairs([("A*02:01:01:01", "GSHSMRYF")]);
        assert_eq!(reference.get("A*02:01;A*02:01:01:01"), Some("GSHSMRYF"));
        assert_eq!(reference.get("A*02:06;A*02:01"), None);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(HlaReference::from_dir("/definitely/not/a/dir", "_prot.fasta").is_err());
    }
}
