//! Command execution: assemble collaborators from config, then dispatch.

use std::sync::Arc;

use cover_config::{Config, TransportKind};
use cover_core::store_error::map_store_error;
use cover_core::{Cover, CoverSet, MoveReport};
use cover_io::{JsonFileStore, SimulatedPublisher, SpoolPublisher};
use cover_traits::{CommandPublisher, MonotonicClock};
use eyre::WrapErr;
use serde_json::json;

use crate::cli::Commands;

struct Collaborators {
    publisher: Arc<dyn CommandPublisher + Send + Sync>,
    store: Arc<JsonFileStore>,
}

fn collaborators(cfg: &Config) -> eyre::Result<Collaborators> {
    let publisher: Arc<dyn CommandPublisher + Send + Sync> = match cfg.transport.kind {
        TransportKind::Sim => Arc::new(SimulatedPublisher::new()),
        TransportKind::Spool => {
            let Some(path) = &cfg.transport.spool_path else {
                eyre::bail!("transport.spool_path is required for kind = \"spool\"");
            };
            Arc::new(SpoolPublisher::new(path.clone()))
        }
    };
    let store = Arc::new(JsonFileStore::new(
        cfg.store.path.clone(),
        cfg.store.key.clone(),
    ));
    Ok(Collaborators { publisher, store })
}

fn load_covers(cfg: &Config, c: &Collaborators) -> eyre::Result<CoverSet> {
    CoverSet::load(
        cfg,
        Arc::clone(&c.publisher),
        c.store.clone(),
        Arc::new(MonotonicClock::new()),
    )
    .wrap_err("load covers")
}

pub fn run(cfg: &Config, cmd: Commands, json: bool) -> eyre::Result<()> {
    let c = collaborators(cfg)?;
    match cmd {
        Commands::SelfCheck => self_check(cfg, &c, json),
        Commands::Status { cover } => {
            let set = load_covers(cfg, &c)?;
            let covers: Vec<Arc<Cover>> = match cover {
                Some(id) => vec![set.cover(&id)?],
                None => set.iter().cloned().collect(),
            };
            for cover in covers {
                print_status(&cover, json);
            }
            Ok(())
        }
        Commands::Stop { cover } => {
            let set = load_covers(cfg, &c)?;
            let cover = set.cover(&cover)?;
            cover.stop();
            print_status(&cover, json);
            Ok(())
        }
        Commands::Open { cover } => movement(cfg, &c, &cover, json, Cover::open),
        Commands::Close { cover } => movement(cfg, &c, &cover, json, Cover::close),
        Commands::SetPosition { cover, position } => {
            movement(cfg, &c, &cover, json, |cv| cv.set_position(position))
        }
        Commands::Calibrate { cover } => movement(cfg, &c, &cover, json, Cover::calibrate),
    }
}

/// Run one blocking movement with Ctrl-C mapped to `stop`.
fn movement(
    cfg: &Config,
    c: &Collaborators,
    id: &str,
    json: bool,
    op: impl FnOnce(&Cover) -> MoveReport,
) -> eyre::Result<()> {
    let set = load_covers(cfg, c)?;
    let cover = set.cover(id)?;

    let on_signal = Arc::clone(&cover);
    ctrlc::set_handler(move || {
        tracing::warn!(cover = %on_signal.id(), "interrupt received; stopping");
        on_signal.stop();
    })
    .wrap_err("install Ctrl-C handler")?;

    let report = op(cover.as_ref());
    print_report(&cover, &report, json);

    // The movement itself never fails; surface a lost write so the operator
    // knows the next start will restore a stale position.
    if let Some(err) = cover.last_store_error() {
        return Err(eyre::Report::new(err)).wrap_err("position was not persisted");
    }
    Ok(())
}

fn print_report(cover: &Cover, report: &MoveReport, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "cover": cover.id(),
                "outcome": report.outcome.to_string(),
                "position": report.position,
                "elapsed_ms": report.elapsed.as_millis() as u64,
            })
        );
    } else {
        println!(
            "{}: {} at {}% after {:.1}s",
            cover.id(),
            report.outcome,
            report.position,
            report.elapsed.as_secs_f64()
        );
    }
}

fn print_status(cover: &Cover, json: bool) {
    let state = cover.state();
    if json {
        println!(
            "{}",
            json!({
                "cover": state.id,
                "name": cover.name(),
                "position": state.position,
                "direction": state.direction.to_string(),
                "closed": state.is_closed(),
            })
        );
    } else {
        let position = state
            .position
            .map_or_else(|| "unknown".to_string(), |p| format!("{p}%"));
        println!(
            "{}\t{}\t{}\t{}",
            state.id,
            cover.name(),
            position,
            state.direction
        );
    }
}

fn self_check(cfg: &Config, c: &Collaborators, json: bool) -> eyre::Result<()> {
    let doc = c
        .store
        .read_document()
        .map_err(|e| map_store_error(&e))
        .wrap_err_with(|| format!("read position store {}", c.store.path().display()))?;
    if !c.publisher.is_available() {
        eyre::bail!("transport {:?} is not available", cfg.transport.kind);
    }
    let covers = cfg.covers().count();
    tracing::info!(covers, stored = doc.data.len(), "self-check passed");
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "covers": covers,
                "stored_positions": doc.data.len(),
                "transport": format!("{:?}", cfg.transport.kind).to_lowercase(),
            })
        );
    } else {
        println!(
            "OK: {covers} cover(s), {} stored position(s), transport {:?}",
            doc.data.len(),
            cfg.transport.kind
        );
    }
    Ok(())
}
