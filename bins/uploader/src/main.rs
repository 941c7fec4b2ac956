//! mediarelay upload client
//!
//! Uploads one or more files to a mediarelay server and prints their URLs.
//!
//! Usage: mediarelay-upload --server http://localhost:5000 photo.png clip.mp4

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediarelay_client::{HttpTransport, NotificationKind, SelectedFile, UploadSession};

#[derive(Debug, Parser)]
#[command(name = "mediarelay-upload", version, about = "Upload files through a mediarelay server")]
struct Args {
    /// Server base URL.
    #[arg(long, env = "MEDIARELAY_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// After uploading, print only the URL of the result with this name.
    #[arg(long, value_name = "NAME")]
    open: Option<String>,

    /// Files to upload.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediarelay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let transport = HttpTransport::new(&args.server)?;
    debug!(endpoint = transport.endpoint(), "Using upload endpoint");
    let session = UploadSession::new(Arc::new(transport));

    let mut failures = 0usize;
    for path in &args.files {
        let file = match SelectedFile::from_path(path).await {
            Ok(file) => file,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failures += 1;
                continue;
            }
        };
        if let Err(e) = session.select_file(file) {
            eprintln!("{}: {e}", path.display());
            failures += 1;
            continue;
        }

        if upload_with_progress(&session).await.is_err() {
            failures += 1;
        }
        if let Some(note) = session.notification() {
            match note.kind {
                NotificationKind::Success => println!("{}", note.message),
                NotificationKind::Error => eprintln!("{}", note.message),
            }
        }
    }

    if let Some(name) = &args.open {
        match session.open_result(name) {
            Some(url) => println!("{url}"),
            None => anyhow::bail!("no uploaded file named {name}"),
        }
    } else {
        for result in session.results() {
            println!("{}\t{}", result.name, result.url);
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} uploads failed", args.files.len());
    }
    Ok(())
}

/// Run the session's upload while rendering its progress.
async fn upload_with_progress(session: &UploadSession) -> Result<(), mediarelay_client::ClientError> {
    let name = session.selected().map(|f| f.name).unwrap_or_default();
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(name);

    let upload = session.upload();
    tokio::pin!(upload);
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    let outcome = loop {
        tokio::select! {
            outcome = &mut upload => break outcome,
            _ = ticker.tick() => bar.set_position(u64::from(session.progress())),
        }
    };

    bar.set_position(u64::from(session.progress()));
    match outcome {
        Ok(_) => bar.finish(),
        Err(_) => bar.abandon(),
    }
    outcome.map(|_| ())
}
