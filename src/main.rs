use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sheet_topo::bab::{BabConfig, BabFilter};
use sheet_topo::output::{graphviz, tables, Flavor};
use sheet_topo::pdb::{Sses, Stride};
use sheet_topo::sheet::filter::{ApJumpFilter, PccFilter};
use sheet_topo::SheetTopology;

#[derive(Parser)]
#[command(name = "sheet-topo")]
#[command(about = "Beta-sheet topology analysis from PDB + STRIDE", long_about = None)]
struct Cli {
    /// Input PDB file
    pdb_file: PathBuf,

    /// STRIDE output file (ignored with --with-stride)
    stride_file: Option<PathBuf>,

    /// Extract this many adjacent beta-strands from each sheet and print
    /// their topology strings
    #[arg(short = 'e', long = "extract-sheets")]
    extract_sheets: Option<usize>,

    /// Write the strand arrangement as a graphviz dot file; '-' prints the
    /// dot graph to stdout and suppresses all other output
    #[arg(short = 'g', long = "graphviz")]
    graphviz: Option<String>,

    /// Use the SSE assignments of the PDB file instead of the STRIDE ones
    #[arg(short = 'n', long = "no-stride-sse", default_value_t = false)]
    no_stride_sse: bool,

    /// Output file (stdout when absent)
    #[arg(short = 'o', long = "output-file")]
    output_file: Option<PathBuf>,

    /// Output format: 0 PDB-like, 1 mmCIF-like
    #[arg(short = 't', long = "format-type", default_value_t = 0)]
    format_type: usize,

    /// Invoke the stride command on the PDB file instead of reading a
    /// STRIDE file
    #[arg(short = 'w', long = "with-stride", default_value_t = false)]
    with_stride: bool,

    /// Max residues between the first and the last strand of a unit
    #[arg(long, default_value_t = 60)]
    max_mid_residues: u32,

    /// Max same-sheet strands between the first and the last strand
    #[arg(long, default_value_t = 1)]
    max_mid_strands: u32,

    /// Scores above this cutoff count as left-handed
    #[arg(long, default_value_t = 0.6)]
    cutoff_left_score: f32,

    /// CA atoms closer than this to a triangle are not counted
    #[arg(long, default_value_t = 1.0)]
    min_side_dist: f32,

    /// Anti-parallel pairs jumping farther than this are rare topologies
    #[arg(long, default_value_t = 1)]
    apj_max_allowed_jump: usize,

    /// Parallel crossovers jumping less than this are rare topologies
    #[arg(long, default_value_t = 1)]
    pcc_min_allowed_jump: usize,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // help and version are not argument errors
            let kind = err.kind();
            let _ = err.print();
            return if kind == clap::error::ErrorKind::DisplayHelp
                || kind == clap::error::ErrorKind::DisplayVersion
            {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.format_type > 1 {
        anyhow::bail!("unknown format type '{}'", cli.format_type);
    }

    let stride = if cli.with_stride {
        Some(Stride::from_stride_command(&cli.pdb_file)?)
    } else if let Some(path) = &cli.stride_file {
        Some(Stride::from_file(path)?)
    } else {
        None
    };

    let sse_source = match &stride {
        Some(s) if !cli.no_stride_sse => Some(s),
        _ => None,
    };
    let sses = Sses::from_pdb_file(&cli.pdb_file, sse_source)?;

    let hbonds = stride.unwrap_or_default();
    let topo = SheetTopology::new(sses, &hbonds)?;

    // Graphviz-only mode short-circuits everything else.
    if let Some(target) = &cli.graphviz {
        if target == "-" {
            let stdout = io::stdout();
            graphviz::write_dot(&mut stdout.lock(), &topo)?;
            return Ok(());
        }
        let mut file = BufWriter::new(File::create(target)?);
        graphviz::write_dot(&mut file, &topo)?;
    }

    // All sections are buffered so that a failure mid-analysis leaves no
    // partial output behind.
    let mut out: Vec<u8> = Vec::new();

    let flavor = if cli.format_type == 1 {
        Flavor::MmcifLike
    } else {
        Flavor::PdbLike
    };
    let sheet_map = topo.sheet_id_map();

    let bab_config = BabConfig {
        max_mid_residues: cli.max_mid_residues,
        max_mid_strands: cli.max_mid_strands,
        cutoff_left_score: cli.cutoff_left_score,
        min_side_dist: cli.min_side_dist,
        ..Default::default()
    };
    let mut bab = BabFilter::new(&topo, bab_config);

    log_rare_topologies(&topo, cli);

    tables::write_substrands(&mut out, &topo, &sheet_map, flavor)?;
    writeln!(out)?;
    tables::write_helices(&mut out, &topo, flavor)?;
    writeln!(out)?;
    tables::write_sheet_info(&mut out, &topo, flavor)?;
    writeln!(out)?;
    if let Some(n) = cli.extract_sheets {
        tables::write_ext_sheets(&mut out, &topo, n, flavor)?;
        writeln!(out)?;
    }
    tables::write_cycles(&mut out, &topo, flavor)?;
    writeln!(out)?;

    if flavor == Flavor::PdbLike {
        let rows = tables::strand_pair_rows(&topo, &sheet_map, &mut bab)?;
        tables::write_strand_pairs(&mut out, &rows)?;
        writeln!(out)?;
        tables::write_residue_pairs(&mut out, &topo)?;
    } else {
        tables::write_adjacency_list(&mut out, &topo)?;
        let results = tables::handedness_survey(&topo, &mut bab);
        tables::write_handedness(&mut out, &topo, &results)?;
    }

    match &cli.output_file {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            file.write_all(&out)?;
            file.flush()?;
        }
        None => io::stdout().write_all(&out)?,
    }
    Ok(())
}

/// Count rare topologies between sequential strands for the log.
fn log_rare_topologies(topo: &SheetTopology, cli: &Cli) {
    let pcc = PccFilter {
        min_allowed_jump: cli.pcc_min_allowed_jump,
    };
    let apj = ApJumpFilter {
        max_allowed_jump: cli.apj_max_allowed_jump,
    };

    let strands = &topo.strand_indices;
    let mut n_pcc = 0usize;
    let mut n_apj = 0usize;
    for pair in strands.windows(2) {
        if pcc.is_rare(topo, pair[0], pair[1], false, false) {
            n_pcc += 1;
        }
        if apj.is_rare(topo, pair[0], pair[1], false, false) {
            n_apj += 1;
        }
    }
    log::debug!("rare topologies between sequential strands: pcc = {n_pcc}, apj = {n_apj}");
}
