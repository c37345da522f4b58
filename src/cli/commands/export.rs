//! `bmt export` - write the reduced index, one file per characteristic

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::io::write_index;

use super::load_dataset;

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output directory (created if missing)
    #[arg(long, short = 'o', default_value = "reduced")]
    pub out: PathBuf,

    /// Field delimiter of the written files
    #[arg(long, short = 'd', default_value = ";")]
    pub delimiter: char,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    if !args.delimiter.is_ascii() {
        return Err(miette::miette!(
            "delimiter must be a single ASCII character, got '{}'",
            args.delimiter
        ));
    }

    let data = load_dataset(global)?;
    let written = write_index(&args.out, &data.index, args.delimiter as u8)?;

    if !global.quiet {
        eprintln!(
            "{} {} file(s) to {}",
            style("Wrote").green(),
            written.len(),
            style(args.out.display()).cyan()
        );
    }
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
