use anyhow::{bail, Context, Result};
use crossline::editor::store::resolve_store_path;
use crossline::editor::{LineEditor, StateStore, SurfaceSize, ToleranceBand};
use crossline::logging;
use crossline::settings::Settings;
use crossline::stream::{
    CoordinatorEvent, FinalTotals, HttpBackend, ProcessingParams, SessionCoordinator,
    SessionUpdate, StreamSession, Throttle,
};
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";
const STATUS_INTERVAL: Duration = Duration::from_millis(120);
const USAGE: &str = "usage: crossline <stream|batch> <video_path>";

fn main() -> Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging, settings.log_file_path());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, video_path) = match args.as_slice() {
        [command, video_path] => (command.as_str(), video_path.clone()),
        _ => bail!(USAGE),
    };

    let mut store = StateStore::open(resolve_store_path(settings.store_path.as_deref()));
    let params = ProcessingParams::load(&store);
    let editor = LineEditor::load(
        &store,
        SurfaceSize::default(),
        ToleranceBand::new(params.tolerance_px),
    );
    tracing::info!(line = ?editor.line(), ?params, store = %store.path().display(), "state restored");

    let backend = HttpBackend::new(
        &settings.backend_url,
        settings.connect_timeout(),
        settings.request_timeout(),
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build async runtime")?;

    let result = match command {
        "stream" => runtime.block_on(run_stream(&settings, backend, &editor, params, video_path)),
        "batch" => runtime.block_on(run_batch(backend, &editor, params, video_path)),
        other => bail!("unknown command {other}\n{USAGE}"),
    };

    if let Err(err) = editor.save(&mut store) {
        tracing::error!(?err, "failed to save line");
    }
    if let Err(err) = params.save(&mut store) {
        tracing::error!(?err, "failed to save parameters");
    }
    result
}

async fn run_stream(
    settings: &Settings,
    backend: HttpBackend,
    editor: &LineEditor,
    params: ProcessingParams,
    video_path: String,
) -> Result<()> {
    let base_url = backend.base_url().clone();
    let session = StreamSession::new(backend, settings.reconnect);
    let mut coordinator = SessionCoordinator::new(session, editor.line(), params)
        .with_debounce(settings.debounce());
    coordinator.set_target(video_path);
    coordinator.engage_auto_streaming()?;

    let mut status = Throttle::new(STATUS_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(err) = res {
                    tracing::warn!(?err, "ctrl-c handler failed");
                }
                coordinator.stop();
                println!("Stopped.");
                return Ok(());
            }
            event = coordinator.next_event() => match event {
                CoordinatorEvent::Restarted(request) => {
                    tracing::info!(line = ?request.line, "processing restarted");
                }
                CoordinatorEvent::Session(SessionUpdate::Progress(snapshot)) => {
                    if status.ready() {
                        println!("{}", snapshot.status_line());
                    }
                }
                CoordinatorEvent::Session(SessionUpdate::Retrying { attempt, delay, .. }) => {
                    println!("Connection lost, retrying ({attempt}) in {} ms…", delay.as_millis());
                }
                CoordinatorEvent::Session(SessionUpdate::Finished(totals)) => {
                    print_totals(&totals, &base_url);
                    return Ok(());
                }
                CoordinatorEvent::Session(SessionUpdate::Failed { reason }) => {
                    bail!("processing failed: {reason}");
                }
            }
        }
    }
}

async fn run_batch(
    backend: HttpBackend,
    editor: &LineEditor,
    params: ProcessingParams,
    video_path: String,
) -> Result<()> {
    let request = crossline::stream::JobRequest::new(video_path, editor.line(), params);
    println!("Processing…");
    let totals = backend.process_batch(&request).await?;
    print_totals(&totals, backend.base_url());
    Ok(())
}

fn print_totals(totals: &FinalTotals, base_url: &url::Url) {
    println!(
        "IN: {} | OUT: {} | NET: {}",
        totals.in_total, totals.out_total, totals.net_total
    );
    for window in &totals.windows {
        println!(
            "  {} - {}  IN {}  OUT {}",
            window.start, window.end, window.in_count, window.out_count
        );
    }
    for artifact in &totals.artifacts {
        let path = artifact.download_path();
        match base_url.join(path.trim_start_matches('/')) {
            Ok(url) => println!("{:?}: {url}", artifact.kind),
            Err(err) => tracing::warn!(%err, %path, "bad artifact url"),
        }
    }
}
