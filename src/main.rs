use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use newsdesk::{
    application::{
        error::AppError,
        export::{ARTICLE_FILE, Exporter},
        publish::ArticleService,
    },
    config,
    domain::content::Content,
    infra::{error::InfraError, publish::PublishClient, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %error, causes = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, causes = ?report.messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Export(args) => run_export(settings, args),
        config::Command::Publish(args) => {
            let content = read_content(&args.file)?;
            let article = article_service(&settings)?.publish(&content).await?;
            print_json(&article)
        }
        config::Command::Update(args) => {
            let content = read_content(&args.file)?;
            let article = article_service(&settings)?
                .update(&args.id, &args.revision, &content)
                .await?;
            print_json(&article)
        }
        config::Command::Fetch(args) => {
            let article = article_service(&settings)?.fetch(&args.id).await?;
            print_json(&article)
        }
        config::Command::Delete(args) => {
            let confirmed = article_service(&settings)?.delete(&args.id).await?;
            info!(
                target = "newsdesk::delete",
                article_id = %args.id,
                confirmed,
                "Delete completed"
            );
            Ok(())
        }
        config::Command::Channel(_) => {
            let channel = article_service(&settings)?.channel().await?;
            print_json(&channel)
        }
        config::Command::Sections(_) => {
            let sections = article_service(&settings)?.sections().await?;
            print_json(&sections)
        }
    }
}

fn run_export(settings: config::Settings, args: config::ExportArgs) -> Result<(), AppError> {
    let content = read_content(&args.file)?;
    let exporter = Exporter::new(settings.export);

    info!(
        target = "newsdesk::export",
        content_id = %content.id,
        path = %args.file.display(),
        "Starting export"
    );

    let exported = exporter.export(&content)?;
    let Some(output) = args.output else {
        println!("{}", exported.json());
        exported.close().map_err(InfraError::from)?;
        return Ok(());
    };

    fs::create_dir_all(&output).map_err(InfraError::from)?;
    fs::copy(exported.article_path(), output.join(ARTICLE_FILE)).map_err(InfraError::from)?;
    let mut written: Vec<PathBuf> = vec![output.join(ARTICLE_FILE)];
    for bundle in exported.bundles() {
        let Some(name) = bundle.file_name() else {
            continue;
        };
        let destination = output.join(name);
        fs::copy(bundle, &destination).map_err(InfraError::from)?;
        written.push(destination);
    }
    exported.close().map_err(InfraError::from)?;

    info!(
        target = "newsdesk::export",
        output = %output.display(),
        files = written.len(),
        "Export completed"
    );
    Ok(())
}

fn article_service(settings: &config::Settings) -> Result<ArticleService, AppError> {
    let api = &settings.api;
    let client = PublishClient::new(api.base_url()?.as_str(), api.credentials()?)?
        .with_timeouts(api.get_timeout, api.upload_timeout);
    Ok(ArticleService::new(
        Exporter::new(settings.export.clone()),
        client,
        api.channel_id()?,
    ))
}

fn read_content(path: &Path) -> Result<Content, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| InfraError::content_file(path.display().to_string(), err.to_string()))?;
    let content: Content = serde_json::from_str(&raw)
        .map_err(|err| InfraError::content_file(path.display().to_string(), err.to_string()))?;
    Ok(content)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{out}");
    Ok(())
}
