use regex::Regex;
use thiserror::Error;

// a locus letter followed by an unstarred group:protein code, e.g. `A01:01`
const UNSTARRED: &str = r"^([ABC])(\d+:\d+)$";

#[derive(Error, Debug, PartialEq)]
pub enum AlleleFormatErr {
    #[error(
        "invalid allele `{allele}`: expected a starred allele such as
    A*03:01:01:01"
    )]
    MissingStar { allele: String },
}

/// Normalizes alleles from peptide tables into the starred short form used as a reference
/// lookup key.
pub struct AlleleNormalizer {
    unstarred: Regex,
}

impl AlleleNormalizer {
    pub fn new() -> Self {
        AlleleNormalizer {
            unstarred: Regex::new(UNSTARRED).expect("valid regex"),
        }
    }

    /// `A01:01` becomes `A*01:01`. Alleles which already contain a `*`, or which do not look
    /// like a locus letter followed by `group:protein`, are returned unchanged.
    pub fn normalize(&self, allele: &str) -> String {
        if allele.contains('*') {
            return allele.to_string();
        }

        match self.unstarred.captures(allele) {
            Some(m) => format!("{}*{}", &m[1], &m[2]),
            None => allele.to_string(),
        }
    }
}

impl Default for AlleleNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a starred allele into the canonical `HLA-{locus}{group}:{protein}` label, discarding
/// any fields past the protein field.
///
/// # Errors
///
/// Returns `AlleleFormatErr::MissingStar` if the allele contains no `*`.
///
/// # Example
///
/// ```
/// assert_eq!(canonicalize("A*03:01:01:01")?, "HLA-A03:01");
/// ```
pub fn canonicalize(allele: &str) -> Result<String, AlleleFormatErr> {
    let Some((locus, code)) = allele.split_once('*') else {
        return Err(AlleleFormatErr::MissingStar {
            allele: allele.to_string(),
        });
    };

    Ok(format!("HLA-{}{}", locus, four_digit(code)))
}

/// Truncates a `:`-separated allele code to its first two fields (four-digit resolution).
pub fn four_digit(allele: &str) -> &str {
    match allele.match_indices(':').nth(1) {
        Some((idx, _)) => &allele[..idx],
        None => allele,
    }
}

/// Drops any `;`-separated annotation trailing an allele, e.g. `A*01:01;HLA-A*01:01:01`.
pub fn strip_annotation(value: &str) -> &str {
    match value.split_once(';') {
        Some((allele, _)) => allele,
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_inserts_star() {
        let normalizer = AlleleNormalizer::new();
        assert_eq!(normalizer.normalize("A01:01"), "A*01:01");
        assert_eq!(normalizer.normalize("C07:702"), "C*07:702");
    }

    #[test]
    fn one_normalizer_serves_many_alleles() {
        let normalizer = AlleleNormalizer::default();
        let alleles = ["A01:01", "B*07:02", "C07:02", "E01:01"]
            .iter()
            .map(|a| normalizer.normalize(a))
            .collect::<Vec<_>>();
        assert_eq!(alleles, ["A*01:01", "B*07:02", "C*07:02", "E01:01"]);
    }

    #[test]
    fn normalize_leaves_other_shapes_alone() {
        let normalizer = AlleleNormalizer::new();
        assert_eq!(normalizer.normalize("A*01:01"), "A*01:01");
        assert_eq!(normalizer.normalize("A*01:01:01:06"), "A*01:01:01:06");
        // only the A, B and C loci are recognised
        assert_eq!(normalizer.normalize("E01:01"), "E01:01");
        assert_eq!(normalizer.normalize("HLA-A02:01"), "HLA-A02:01");
        assert_eq!(normalizer.normalize("A01:01:01"), "A01:01:01");
    }

    #[test]
    fn canonicalize_drops_trailing_fields() {
        assert_eq!(canonicalize("A*03:01:01:01").unwrap(), "HLA-A03:01");
        assert_eq!(canonicalize("B*15:10").unwrap(), "HLA-B15:10");
        assert_eq!(canonicalize("C*07").unwrap(), "HLA-C07");
    }

    #[test]
    fn canonicalize_requires_star() {
        assert_eq!(
            canonicalize("A03:01"),
            Err(AlleleFormatErr::MissingStar {
                allele: "A03:01".to_string()
            })
        );
    }

    #[test]
    fn four_digit_keeps_two_fields() {
        assert_eq!(four_digit("A*01:01:01:06"), "A*01:01");
        assert_eq!(four_digit("A*01:01:01"), "A*01:01");
        assert_eq!(four_digit("A*01:01"), "A*01:01");
        assert_eq!(four_digit("A*01"), "A*01");
    }

    #[test]
    fn annotation_is_stripped() {
        assert_eq!(strip_annotation("A*01:01;extra;more"), "A*01:01");
        assert_eq!(strip_annotation("A*01:01"), "A*01:01");
    }
}
