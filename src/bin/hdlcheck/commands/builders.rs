//! `hdlcheck builders` command
//!
//! Lists every builder with its tool location, availability and version.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use hdlcheck::builder::{Builder, BuilderKind, TracingSink};
use hdlcheck::util::shell::{Shell, Status};

use super::{builder_config, current_dir, load_project_config, DEFAULT_WORK_DIR};
use crate::cli::{BuildersArgs, MessageFormat};

#[derive(Debug, Serialize)]
struct BuilderReport {
    reason: &'static str,
    builder: BuilderKind,
    available: bool,
    version: Option<String>,
    program: Option<PathBuf>,
}

pub fn execute(args: BuildersArgs, no_color: bool) -> Result<()> {
    let shell = Shell::from_flags(no_color, args.message_format == MessageFormat::Json);

    let cwd = current_dir()?;
    let config = load_project_config(&cwd);
    let work_dir = cwd.join(
        config
            .build
            .work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR)),
    );

    for kind in BuilderKind::ALL {
        let builder = kind.create(builder_config(
            kind,
            &config,
            &work_dir,
            None,
            Arc::new(TracingSink),
        ));

        let available = builder.is_available();
        let version = if available {
            builder
                .check_environment()
                .ok()
                .and_then(|_| builder.version().map(str::to_string))
        } else {
            None
        };

        let report = BuilderReport {
            reason: "builder",
            builder: kind,
            available,
            version,
            program: builder.program(),
        };

        let location = report
            .program
            .as_ref()
            .map(|p| format!(" ({})", p.display()))
            .unwrap_or_default();

        if shell.is_json() {
            shell.json_event(&report);
        } else if report.available {
            shell.status(
                Status::Available,
                format!(
                    "{} {}{}",
                    kind,
                    report.version.as_deref().unwrap_or("unknown"),
                    location
                ),
            );
        } else {
            shell.status(Status::Missing, format!("{}{}", kind, location));
        }
    }

    Ok(())
}
