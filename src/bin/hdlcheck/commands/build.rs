//! `hdlcheck build` command

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use rayon::prelude::*;

use hdlcheck::builder::{
    detect_builder, BuildOptions, Builder, BuilderError, BuilderEvent, BuilderKind, EventSink,
    JsonSink, TracingSink,
};
use hdlcheck::core::{Diagnostic, Library, Severity};
use hdlcheck::util::shell::{Shell, Status};

use super::{builder_config, current_dir, load_project_config, DEFAULT_WORK_DIR};
use crate::cli::{BuildArgs, MessageFormat};

pub fn execute(args: BuildArgs, no_color: bool) -> Result<()> {
    let json = args.message_format == MessageFormat::Json;
    let shell = Shell::from_flags(no_color, json);

    let cwd = current_dir()?;
    let config = load_project_config(&cwd);

    // CLI > config > defaults
    let work_dir = args
        .work_dir
        .clone()
        .or_else(|| config.build.work_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));
    let work_dir = cwd.join(work_dir);
    let library = args
        .library
        .clone()
        .or_else(|| config.build.library.clone())
        .unwrap_or_else(Library::work);
    let scope = args.scope.or(config.build.scope).unwrap_or_default();
    let jobs = args.jobs.or(config.build.jobs);
    let kind = args.builder.or_else(|| config.builder());

    if args.tool_path.is_some() && kind.is_none() {
        bail!("--tool-path needs a builder; pass --builder or set build.builder in the config");
    }

    let events: Arc<dyn EventSink> = if json {
        Arc::new(JsonSink::new(io::stdout()))
    } else {
        Arc::new(TracingSink)
    };

    let config_for = |k| builder_config(k, &config, &work_dir, args.tool_path.as_deref(), events.clone());
    let builder: Box<dyn Builder> = match kind {
        Some(kind) => kind.create(config_for(kind)),
        None => {
            let detected = detect_builder(config_for);
            if detected.kind() == BuilderKind::Fallback {
                shell.warn("no HDL tool found; only file types will be checked");
            }
            detected
        }
    };

    builder.check_environment()?;
    shell.status(
        Status::Checking,
        format!(
            "{} file(s) with {} {}",
            args.files.len(),
            builder.name(),
            builder.version().unwrap_or("unknown")
        ),
    );

    // Config flags first, then command-line flags
    let mut flags = config
        .builder_settings(builder.kind())
        .map(|s| s.flags.clone())
        .unwrap_or_default();
    flags.extend(args.flags.iter().cloned());

    let mut options = BuildOptions::new().scope(scope).flags(flags);
    if let Some(secs) = args.timeout {
        options = options.timeout(Duration::from_secs(secs));
    }

    // Runs into the same library are serialized by the builder.
    if let Some(j) = jobs {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(j).build_global() {
            shell.warn(format!("could not size the job pool: {}", e));
        }
    }

    let results: Vec<Result<Vec<Diagnostic>, BuilderError>> = args
        .files
        .par_iter()
        .map(|path| builder.build_source(path, &library, &options))
        .collect();

    let mut errors = 0usize;
    let mut warnings = 0usize;

    for (path, result) in args.files.iter().zip(results) {
        let mut diagnostics = match result {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                tracing::debug!("build of {} failed: {}", path.display(), e);
                let mut diag = e.to_diagnostic(builder.name());
                if diag.file_path.is_none() {
                    diag = diag.with_file(path.clone());
                }
                // Successful builds already streamed their diagnostics as events.
                shell.json_event(&BuilderEvent::Diagnostic(diag.clone()));
                vec![diag]
            }
        };

        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        for diag in &diagnostics {
            match diag.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
                Severity::Info => {}
            }
            shell.diagnostic(diag);
        }
    }

    shell.status(
        if errors > 0 { Status::Error } else { Status::Finished },
        format!(
            "{} file(s): {} error(s), {} warning(s)",
            args.files.len(),
            errors,
            warnings
        ),
    );

    if errors > 0 {
        bail!("found {} error(s)", errors);
    }
    Ok(())
}
