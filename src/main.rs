extern crate env_logger;
#[macro_use]
extern crate log;
use std::{
    fs::File,
    io::{prelude::*, stdout, BufWriter},
    path::Path,
};

use anyhow::{Context, Result};
use clap::Parser;

mod allele;
mod cli;
mod concat;
mod extract;
mod fasta;
mod gene;
mod lookup;
mod netmhcpan;
mod reference;
mod tcr;

use cli::{Cli, Commands};
use gene::{GeneConverter, LookupTable, TenxToImgt};

/// Creates a `BufWriter` for the given output option. This allows for an output file to be passed
/// or otherwise will default to using standard output.
///
/// If `output` is `Some`, it creates a file at the specified path and returns a `BufWriter` for it.
/// If `output` is `None`, it returns a `BufWriter` for the standard output.
fn get_writer(output: &Option<String>) -> Result<impl Write> {
    // get output as a BufWriter - equal to stdout if None
    let writer = BufWriter::new(match output {
        Some(ref x) => {
            let file = File::create(Path::new(x))
                .with_context(|| format!("Unable to create file {x}"))?;
            Box::new(file) as Box<dyn Write + Send>
        }
        None => Box::new(stdout()) as Box<dyn Write + Send>,
    });
    Ok(writer)
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    debug!("chaiprep v{}", cli::VERSION);

    match &cli.command {
        Commands::Concat {
            file1,
            file2,
            output,
        } => {
            concat::concat(file1, file2, output.as_deref())?;
        }
        Commands::Netmhcpan {
            xls,
            binding_threshold,
            out,
        } => {
            netmhcpan::netmhcpan(xls, *binding_threshold, out.as_deref())?;
        }
        Commands::Tcr {
            input_file,
            output_file,
            lookup,
            from,
            to,
        } => {
            let converter: Box<dyn GeneConverter> = match lookup {
                Some(path) => {
                    info!("Converting gene names with {path}");
                    Box::new(LookupTable::from_path(path, from, to)?)
                }
                None => {
                    info!("Converting gene names from 10x to IMGT");
                    Box::new(TenxToImgt::new())
                }
            };

            tcr::format_tcr(input_file, output_file, converter.as_ref())?;
        }
        Commands::ExtractAa { infile, out } => {
            let records = extract::extract_aa(infile.as_deref())?;

            let mut writer = get_writer(out)?;
            writer.write_all(records.as_bytes())?;
            writer.flush()?;
        }
        Commands::LookupHla {
            hla_dir,
            input,
            outdir,
            suffix,
        } => {
            lookup::lookup_hla(hla_dir, input, outdir, suffix)?;
            info!("Completed successfully.")
        }
        Commands::TransformHla { allele } => {
            println!("{}", allele::canonicalize(allele)?);
        }
    };
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        // report any errors that are produced
        if log_enabled!(log::Level::Error) {
            error!("{}", err);
            err.chain()
                .skip(1)
                .for_each(|cause| error!("  because: {}", cause));
        } else {
            eprintln!("Error: {}", err);
            err.chain()
                .skip(1)
                .for_each(|cause| eprintln!("  because: {}", cause));
        }

        std::process::exit(1);
    }
}
