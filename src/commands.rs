use std::{fs, sync::Arc};

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, RenderArgs};
use crate::dashboard::Dashboard;
use crate::region::RegionLevel;
use crate::render::Viewport;
use crate::round::RoundState;
use crate::source::{DataSource, DiskSource, HttpSource};
use crate::view::{MemStore, ViewParams, ViewStore};

pub fn render(cli: &Cli, args: &RenderArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", args.output.display());
    }
    if args.level == RegionLevel::SubCounty && args.parent.is_none() {
        bail!("--parent is required at the uat level");
    }

    if cli.verbose > 0 {
        eprintln!(
            "[render] pack={} round={} level={} -> {}",
            args.data,
            args.round,
            args.level,
            args.output.display()
        );
    }

    let source: Arc<dyn DataSource> =
        if args.data.starts_with("http://") || args.data.starts_with("https://") {
            Arc::new(HttpSource::new(args.data.clone()))
        } else {
            Arc::new(DiskSource::new(&args.data))
        };

    let round = if args.live {
        RoundState::live(&args.round)
    } else {
        RoundState::preloaded(&args.round, !args.no_data)
    };

    // Seed the view store so the dashboard opens directly on the requested
    // level/parent, the same way a shared link would.
    let mut store = MemStore::new();
    store.write(&ViewParams {
        level: args.level,
        parent: args.parent.clone(),
        round: args.round.clone(),
        location: args.location.clone(),
    })?;

    // The pipeline is single-threaded and event-driven; a current-thread
    // runtime is all it needs.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    let svg = runtime.block_on(async {
        let mut dash = Dashboard::new(
            source,
            Box::new(store),
            round.clone(),
            Viewport::new(args.width, args.height),
        );
        dash.select_round(round).await?;
        dash.set_metric(args.metric);
        dash.set_normalization(args.normalization);
        if let Some(threshold) = args.threshold {
            dash.set_threshold(threshold);
        }
        let svg = dash.render_svg()?;
        dash.teardown();
        anyhow::Ok(svg)
    })?;

    fs::write(&args.output, svg)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if cli.verbose > 0 {
        eprintln!("[render] wrote {}", args.output.display());
    }
    Ok(())
}
