use crate::cli::ScanArgs;
use crate::config::Settings;
use crate::error::{CliError, Result};
use rxnet::core::io::xyz::read_structure_file;
use rxnet::engine::progress::{Progress, ProgressReporter};
use rxnet::workflows::search::{self, JobStatus};
use tracing::info;

pub fn run(args: ScanArgs) -> Result<()> {
    let settings = Settings::from_file(&args.config)?;
    let scan_config = settings.scan_config(&args)?;
    let optimizer = settings.optimizer(args.keep_scratch);
    let canonicalizer = settings.canonicalizer()?;

    info!("Loading starting geometry from {:?}", &args.input);
    let frame = read_structure_file(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    let jobs = settings.job_specs(&frame.structure)?;

    std::fs::create_dir_all(&args.results)?;

    println!("Starting {} constrained scan job(s)...", jobs.len());
    let reporter = ProgressReporter::with_callback(Box::new(progress_line));

    let summary = search::run(
        &jobs,
        &args.results,
        &scan_config,
        &optimizer,
        &canonicalizer,
        &reporter,
    )?;

    println!(
        "Scan batch finished: {} completed, {} degenerate, {} failed.",
        summary.completed(),
        summary.degenerate(),
        summary.failed()
    );
    for report in &summary.reports {
        match &report.status {
            JobStatus::Completed => {}
            JobStatus::ScanFailed => {
                println!(
                    "  Job {:04}: scan failed, see sentinel in {}",
                    report.scan_index,
                    report.folder.display()
                );
            }
            JobStatus::Degenerate => {
                println!(
                    "  Job {:04}: no stable minima, pathway excluded",
                    report.scan_index
                );
            }
            JobStatus::Error(message) => {
                println!("  Job {:04}: error: {}", report.scan_index, message);
            }
        }
    }
    Ok(())
}

fn progress_line(event: Progress) {
    match event {
        Progress::PhaseStart { name } => println!("==> {name}"),
        Progress::Message(text) => println!("    {text}"),
        _ => {}
    }
}
