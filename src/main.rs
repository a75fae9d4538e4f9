use std::process::ExitCode;

use planner::Planner;
use structopt::StructOpt;

mod config;
mod cvswork;
mod error;
mod local;
mod lock;
mod orchestrator;
mod signal;

pub use error::Error;

use config::{DebugFlags, Opt};
use cvswork::CvsWork;
use local::LocalRepository;
use orchestrator::{CvsSuck, Traversal};

fn main() -> ExitCode {
    let opt = Opt::from_args();

    let debug = match DebugFlags::parse(opt.verbose, &opt.debug) {
        Ok(debug) => debug,
        Err(e) => {
            eprintln!("cvssuck: {}", e);
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_logging(&debug) {
        eprintln!("cvssuck: could not initialise logging: {}", e);
        return ExitCode::from(1);
    }

    let modules = match config::resolve_modules(&opt.rest) {
        Ok(modules) => modules,
        Err(e) => {
            eprintln!("cvssuck: {}", e);
            return ExitCode::from(1);
        }
    };

    match run(&opt, &debug, modules) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(debug: &DebugFlags) -> Result<(), flexi_logger::FlexiLoggerError> {
    let mut spec = "info".to_string();
    if debug.command || debug.protocollog {
        spec.push_str(",cvssuck_process=debug");
    }
    if debug.mkdir || debug.mkdir_exist {
        spec.push_str(",cvssuck::lock=debug");
    }

    flexi_logger::Logger::try_with_env_or_str(spec)?
        .format(flexi_logger::colored_default_format)
        .start()?;
    Ok(())
}

fn run(opt: &Opt, debug: &DebugFlags, modules: Vec<config::ModuleQueueEntry>) -> anyhow::Result<()> {
    let scratch_parent = std::env::var_os("TMPDIR").unwrap_or_else(|| "/tmp".into());
    let scratch = tempfile::Builder::new()
        .prefix("cvssuck-")
        .tempdir_in(&scratch_parent)?;

    // One workspace, and one `next_workdir` counter, for the whole run: every
    // module's sibling scratch directories share the same allocator so two
    // modules never collide on the same physical path.
    let mut work = CvsWork::new(&opt.cvsroot, scratch.path().to_path_buf())?;

    for entry in modules {
        log::info!(
            "mirroring module {} into {} (locks in {})",
            entry.module,
            entry.output_dir.display(),
            entry.lock_dir.display()
        );

        let local = LocalRepository::new(entry.output_dir.clone(), entry.lock_dir.clone());
        let planner = build_planner(opt);
        let traversal = if opt.breadth_first {
            Traversal::BreadthFirst
        } else {
            Traversal::DepthFirst
        };

        let mut cvssuck = CvsSuck::new(&mut work, local, planner, traversal);
        cvssuck.update_module(&entry.module)?;
    }

    if debug.leavetmp {
        let path = scratch.into_path();
        log::info!("leaving scratch directory at {} (-D leavetmp)", path.display());
    }

    Ok(())
}

fn build_planner(opt: &Opt) -> Box<dyn Planner> {
    let mut planner: Box<dyn Planner> = Box::new(planner::ExactPlanner::new(opt.introduce_1_1));
    for _ in 0..opt.skeleton {
        planner = Box::new(planner::Skeleton::new(planner, opt.introduce_1_1));
    }
    planner
}
