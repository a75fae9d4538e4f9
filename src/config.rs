//! Argument parsing, the module queue, and the closed set of `-D` debug
//! toggles.

use std::path::PathBuf;

use structopt::StructOpt;

use crate::Error;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "cvssuck",
    about = "Mirrors a remote CVS repository into a local RCS tree, using only the ordinary CVS client/server protocol."
)]
pub struct Opt {
    #[structopt(short, help = "traverse the module tree breadth-first instead of depth-first")]
    pub breadth_first: bool,

    #[structopt(
        short,
        parse(from_occurrences),
        help = "wrap the planner in a Skeleton stage; stackable (-ss wraps twice)"
    )]
    pub skeleton: u8,

    #[structopt(
        short = "1",
        help = "introduce a synthetic dead 1.1 when the remote history omits it"
    )]
    pub introduce_1_1: bool,

    #[structopt(short, help = "shorthand for -D command,attic,leavetmp")]
    pub verbose: bool,

    #[structopt(
        short = "D",
        long = "debug",
        use_delimiter = true,
        help = "comma-separated debug toggles: command,attic,protocollog,leavetmp,mkdir,mkdir_exist"
    )]
    pub debug: Vec<String>,

    #[structopt(help = "CVSROOT of the remote repository, e.g. :pserver:anon@cvs.example.org:/cvsroot")]
    pub cvsroot: String,

    #[structopt(
        help = "module names, interspersed with -o/-O/-l/-L output and lock targets that apply to the modules following them"
    )]
    pub rest: Vec<String>,
}

/// The closed set of `-D` toggles; see §4.7/§4.8 for what each one does.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugFlags {
    pub command: bool,
    pub attic: bool,
    pub protocollog: bool,
    pub leavetmp: bool,
    pub mkdir: bool,
    pub mkdir_exist: bool,
}

impl DebugFlags {
    pub fn parse(verbose: bool, raw: &[String]) -> Result<Self, Error> {
        let mut flags = DebugFlags::default();

        if verbose {
            flags.command = true;
            flags.attic = true;
            flags.leavetmp = true;
        }

        for entry in raw {
            for name in entry.split(',') {
                match name {
                    "" => {}
                    "command" => flags.command = true,
                    "attic" => flags.attic = true,
                    "protocollog" => flags.protocollog = true,
                    "leavetmp" => flags.leavetmp = true,
                    "mkdir" => flags.mkdir = true,
                    "mkdir_exist" => flags.mkdir_exist = true,
                    other => return Err(Error::UnknownDebugFlag(other.to_string())),
                }
            }
        }

        Ok(flags)
    }
}

#[derive(Debug, Clone)]
enum OutputTarget {
    /// `-o dir`: every module following it shares exactly `dir`.
    Exact(PathBuf),
    /// `-O base`: every module following it gets `base/<module>`.
    Base(PathBuf),
}

#[derive(Debug, Clone)]
enum LockTarget {
    Exact(PathBuf),
    Base(PathBuf),
}

/// One module to mirror, with its resolved output and lock directories.
#[derive(Debug, Clone)]
pub struct ModuleQueueEntry {
    pub module: String,
    pub output_dir: PathBuf,
    pub lock_dir: PathBuf,
}

/// Walks `rest` (everything after the cvsroot) resolving the output/lock
/// target in effect at each module name. `-o`/`-O` also reset the lock
/// target to track the output target, unless a later `-l`/`-L` overrides it
/// again — matching "setting -o or -O resets the lock setting to match
/// output unless overridden later".
pub fn resolve_modules(rest: &[String]) -> Result<Vec<ModuleQueueEntry>, Error> {
    let mut modules = Vec::new();
    let mut output: Option<OutputTarget> = None;
    let mut lock: Option<LockTarget> = None;
    let mut lock_tracks_output = true;

    let mut iter = rest.iter();
    while let Some(token) = iter.next() {
        match token.as_str() {
            "-o" => {
                output = Some(OutputTarget::Exact(take_arg(&mut iter, "-o")?));
                lock_tracks_output = true;
            }
            "-O" => {
                output = Some(OutputTarget::Base(take_arg(&mut iter, "-O")?));
                lock_tracks_output = true;
            }
            "-l" => {
                lock = Some(LockTarget::Exact(take_arg(&mut iter, "-l")?));
                lock_tracks_output = false;
            }
            "-L" => {
                lock = Some(LockTarget::Base(take_arg(&mut iter, "-L")?));
                lock_tracks_output = false;
            }
            name if name.starts_with('-') => {
                return Err(Error::Usage(format!("unrecognised option {}", name)));
            }
            module => {
                let output = output
                    .as_ref()
                    .ok_or_else(|| Error::Usage(format!("module {} named before an -o/-O output target", module)))?;
                let output_dir = resolve_output(output, module);
                let lock_dir = if lock_tracks_output {
                    output_dir.clone()
                } else {
                    lock.as_ref().map(|l| resolve_lock(l, module)).unwrap_or_else(|| output_dir.clone())
                };

                modules.push(ModuleQueueEntry {
                    module: module.to_string(),
                    output_dir,
                    lock_dir,
                });
            }
        }
    }

    if modules.is_empty() {
        return Err(Error::Usage("no modules specified".to_string()));
    }

    Ok(modules)
}

fn take_arg<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<PathBuf, Error> {
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| Error::Usage(format!("{} requires a directory argument", flag)))
}

fn resolve_output(target: &OutputTarget, module: &str) -> PathBuf {
    match target {
        OutputTarget::Exact(dir) => dir.clone(),
        OutputTarget::Base(base) => base.join(module),
    }
}

fn resolve_lock(target: &LockTarget, module: &str) -> PathBuf {
    match target {
        LockTarget::Exact(dir) => dir.clone(),
        LockTarget::Base(base) => base.join(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_exact_output() {
        let modules = resolve_modules(&s(&["-o", "/mirror", "mymodule"])).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].output_dir, PathBuf::from("/mirror"));
        assert_eq!(modules[0].lock_dir, PathBuf::from("/mirror"));
    }

    #[test]
    fn test_base_output_per_module() {
        let modules = resolve_modules(&s(&["-O", "/mirror", "a", "b"])).unwrap();
        assert_eq!(modules[0].output_dir, PathBuf::from("/mirror/a"));
        assert_eq!(modules[1].output_dir, PathBuf::from("/mirror/b"));
    }

    #[test]
    fn test_lock_target_overrides_default() {
        let modules = resolve_modules(&s(&["-o", "/mirror", "-l", "/locks", "mymodule"])).unwrap();
        assert_eq!(modules[0].output_dir, PathBuf::from("/mirror"));
        assert_eq!(modules[0].lock_dir, PathBuf::from("/locks"));
    }

    #[test]
    fn test_output_reset_clears_prior_lock_override() {
        let modules = resolve_modules(&s(&[
            "-o", "/mirror1", "-l", "/locks1", "a", "-o", "/mirror2", "b",
        ]))
        .unwrap();
        assert_eq!(modules[0].lock_dir, PathBuf::from("/locks1"));
        assert_eq!(modules[1].output_dir, PathBuf::from("/mirror2"));
        assert_eq!(modules[1].lock_dir, PathBuf::from("/mirror2"));
    }

    #[test]
    fn test_module_before_output_is_usage_error() {
        assert!(resolve_modules(&s(&["mymodule"])).is_err());
    }

    #[test]
    fn test_verbose_sets_expected_flags() {
        let flags = DebugFlags::parse(true, &[]).unwrap();
        assert!(flags.command && flags.attic && flags.leavetmp);
        assert!(!flags.mkdir);
    }

    #[test]
    fn test_debug_flags_from_csv() {
        let flags = DebugFlags::parse(false, &s(&["mkdir,mkdir_exist"])).unwrap();
        assert!(flags.mkdir && flags.mkdir_exist);
        assert!(!flags.command);
    }

    #[test]
    fn test_unknown_debug_flag_errors() {
        assert!(DebugFlags::parse(false, &s(&["bogus"])).is_err());
    }
}
