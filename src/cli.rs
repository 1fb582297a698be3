use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Parser, Subcommand};

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🧬 chaiprep version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   utilities for preparing peptide, HLA and TCR inputs
   for structure prediction";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    flatten_help = true,
    styles = STYLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Concatenate two FASTA files, naming the output after both inputs
    #[command(arg_required_else_help = true)]
    Concat {
        /// the first FASTA file (e.g. ORF6_Q2HRD3_0_SB_B15_10.fasta)
        #[arg(long, short = '1')]
        file1: String,

        /// the second FASTA file (e.g. 2_tcr_fasta.fa)
        #[arg(long, short = '2')]
        file2: String,

        /// the output FASTA file. if not given, this is computed from the two input names:
        ///   {file1 stem}_{file2 stem without `_fasta`}_chai.fasta
        #[arg(long, short, verbatim_doc_comment)]
        output: Option<String>,
    },

    /// Annotate NetMHCpan .xls output with binder classes and filter by EL_Rank
    #[command(arg_required_else_help = true)]
    Netmhcpan {
        /// the NetMHCpan .xls output, named like `{orf}_HLA-{allele}_....xls`
        #[arg(long)]
        xls: String,

        /// keep rows with EL_Rank at or below this value. `inf` keeps every row.
        #[arg(
            long,
            value_parser = |x: &str| parse_threshold(x),
            default_value = "2.0"
        )]
        binding_threshold: f64,

        /// the output .csv. defaults to {orf}_{allele}_filtered_netmhc.csv, with the
        /// allele's `:` replaced by `_`
        #[arg(long)]
        out: Option<String>,
    },

    /// Split a 10x-style TCR table into beta and alpha chains, convert gene names and rejoin
    #[command(arg_required_else_help = true)]
    Tcr {
        /// the input .csv, with columns ID,TRBV,TRBJ,TRBC,TRB_CDR3,TRAV,TRAJ,TRA_CDR3
        #[arg(long, short)]
        input_file: String,

        /// the output .csv
        #[arg(long, short)]
        output_file: String,

        /// a gene name conversion table (.csv) to use instead of the built-in 10x to IMGT rules
        #[arg(long)]
        lookup: Option<String>,

        /// the lookup table column holding the input gene names
        #[arg(long, default_value = "tenx")]
        from: String,

        /// the lookup table column holding the output gene names
        #[arg(long, default_value = "imgt")]
        to: String,
    },

    /// Reduce FASTA-like alignment output to `>protein|name=...` records
    ExtractAa {
        /// the input file. reads from standard input if not given
        #[arg(long, short)]
        infile: Option<String>,

        /// the output file. writes to standard output if not given
        #[arg(long, short)]
        out: Option<String>,
    },

    /// Write a peptide + HLA sequence FASTA for every row of a peptide table
    #[command(arg_required_else_help = true)]
    LookupHla {
        /// the directory of IMGT/HLA protein FASTA files
        #[arg(long)]
        hla_dir: String,

        /// the peptide table (.csv), with columns Peptide,Pos,orf,binder,allele
        #[arg(long)]
        input: String,

        /// the directory to write one .fasta per row into
        #[arg(long, default_value = ".")]
        outdir: String,

        /// only files in --hla-dir whose name ends with this are read
        #[arg(long, default_value = "_prot.fasta")]
        suffix: String,
    },

    /// Print the canonical HLA-{locus}{group}:{protein} form of an allele
    #[command(arg_required_else_help = true)]
    TransformHla {
        /// the raw allele, e.g. A*03:01:01:01
        #[arg(long, short)]
        allele: String,
    },
}

/// Error type for parsing a binding threshold.
#[derive(Debug)]
pub struct ParseThresholdErr(String);

impl std::fmt::Display for ParseThresholdErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid threshold: {}", self.0)
    }
}

impl std::error::Error for ParseThresholdErr {}

/// Parses an EL_Rank threshold, which must be a non-negative number or `inf`.
pub fn parse_threshold(arg: &str) -> Result<f64, ParseThresholdErr> {
    let value = match arg.trim().to_lowercase().as_str() {
        "inf" => f64::INFINITY,
        s => s.parse::<f64>().map_err(|_| {
            ParseThresholdErr(indoc::formatdoc! {"
            expected a number or `inf`, got '{arg}'. For example:
              --binding-threshold 2
              --binding-threshold 0.5
              --binding-threshold inf
            "})
        })?,
    };

    if value.is_nan() || value < 0.0 {
        return Err(ParseThresholdErr(format!(
            "'{arg}' is not a valid EL_Rank (should be at least 0)"
        )));
    }

    Ok(value)
}
