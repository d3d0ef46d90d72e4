use anyhow::{bail, Context, Result};
use log::info;
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use diff_review::{DiffSession, GroupId, SessionOptions, SessionRegistry};

const USAGE: &str = "usage: review [--accept|--reject] <baseline> <working> [<baseline> <working> ...]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Keep,
    Accept,
    Reject,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (resolution, paths) = parse_args(&args)?;
    let options = session_options()?;

    let group = GroupId::from("cli");
    let mut registry = SessionRegistry::new();
    registry.subscribe(|status| {
        info!(
            "Group {}: {} sessions, pending: {}",
            status.group, status.sessions, status.any_pending
        );
    });

    // The registry only holds weak references
    let mut sessions = Vec::new();
    for pair in paths.chunks_exact(2) {
        let (baseline_path, working_path) = (&pair[0], &pair[1]);
        let baseline = fs::read_to_string(baseline_path)
            .with_context(|| format!("Failed to read baseline {}", baseline_path.display()))?;
        let working = fs::read_to_string(working_path)
            .with_context(|| format!("Failed to read working file {}", working_path.display()))?;

        let mut session = DiffSession::builder(working_path.display().to_string(), &baseline, &working)
            .options(options.clone())
            .build();

        // The baseline file stands in for the host document
        let target = baseline_path.clone();
        session.set_document_writer(move |text: &str| {
            fs::write(&target, text).with_context(|| format!("Failed to write {}", target.display()))
        });

        let handle = Rc::new(RefCell::new(session));
        registry.register(group.clone(), &handle);
        sessions.push(handle);
    }

    for handle in &sessions {
        let session = handle.borrow();
        let state = if session.has_pending_changes() {
            "pending"
        } else {
            "clean"
        };
        println!("{}: {} chunks, {}", session.id(), session.chunks().len(), state);
        if !session.chunks().is_empty() {
            println!("{}", session.chunks());
        }
    }

    match resolution {
        Resolution::Keep => {}
        Resolution::Accept => {
            let accepted = registry
                .accept_all_in_group(&group)
                .context("Failed to accept changes")?;
            println!("Accepted {} sessions", accepted);
        }
        Resolution::Reject => {
            let rejected = registry.reject_all_in_group(&group);
            println!("Rejected {} sessions", rejected);
        }
    }

    registry.poll_changes();
    let status = registry.status(&group);
    println!(
        "Group {}: {} active sessions, pending changes: {}",
        status.group, status.sessions, status.any_pending
    );

    Ok(())
}

fn parse_args(args: &[String]) -> Result<(Resolution, Vec<PathBuf>)> {
    let mut resolution = Resolution::Keep;
    let mut paths = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--accept" | "--reject" if resolution != Resolution::Keep => {
                bail!("--accept and --reject are mutually exclusive\n{}", USAGE)
            }
            "--accept" => resolution = Resolution::Accept,
            "--reject" => resolution = Resolution::Reject,
            "-h" | "--help" => bail!("{}", USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            path => paths.push(PathBuf::from(path)),
        }
    }

    if paths.is_empty() || paths.len() % 2 != 0 {
        bail!("expected pairs of baseline and working files\n{}", USAGE);
    }

    Ok((resolution, paths))
}

/// Default options, with `REVIEW_QUIET_MS` overriding the quiet period
fn session_options() -> Result<SessionOptions> {
    let options = SessionOptions::default();

    match env::var("REVIEW_QUIET_MS") {
        Ok(value) => {
            let millis: u64 = value
                .parse()
                .with_context(|| format!("REVIEW_QUIET_MS must be a number of milliseconds, got {:?}", value))?;
            Ok(options.quiet_period(Duration::from_millis(millis)))
        }
        Err(_) => Ok(options),
    }
}
