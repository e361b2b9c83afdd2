use crate::error::{ErrorKind, Result};
use crate::records;
use exn::{OptionExt, ResultExt};
use mapgen_compress::Compression;
use mapgen_config::Config;
use mapgen_notify::{DEFAULT_ENDPOINTS, Notifier, PingOutcome};
use mapgen_sitemap::{BatchGroup, GroupOptions, Index, Registry, create_sitemap_index, xml};
use mapgen_storage::StorageBackend;
use mapgen_storage::backend::LocalBackend;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Batch records from `input` (or stdin), then write and optionally announce
/// the index.
pub async fn generate(config: &Config, input: Option<&Path>, write_index: bool, ping: bool) -> Result<()> {
    let output = &config.output;
    let compression = output.compression().or_raise(|| ErrorKind::Config)?;
    let options = GroupOptions {
        capacity: output.capacity,
        compression,
        ..GroupOptions::default()
    };
    let registry = Registry::new();
    let group = BatchGroup::in_folder(&output.folder, &output.name, registry.clone(), options)
        .or_raise(|| ErrorKind::Sitemap)?;

    let reader: Box<dyn AsyncBufRead + Send + Unpin> = match input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await.or_raise(|| ErrorKind::Input)?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut lines = reader.lines();
    let (mut number, mut added, mut skipped) = (0usize, 0usize, 0usize);
    while let Some(line) = lines.next_line().await.or_raise(|| ErrorKind::Input)? {
        number += 1;
        match records::parse_record(&line) {
            Ok(Some(record)) => {
                group.add(record).await.or_raise(|| ErrorKind::Sitemap)?;
                added += 1;
            },
            Ok(None) => {},
            Err(reason) => {
                tracing::warn!(line = number, %reason, "Skipping invalid record");
                skipped += 1;
            },
        }
    }

    let names = group.close().await.or_raise(|| ErrorKind::Sitemap)?;
    tracing::info!(records = added, skipped, files = names.len(), registered = registry.len(), "Generated sitemaps");
    for name in &names {
        println!("{}", output.folder.join(name).display());
    }
    if !write_index {
        return Ok(());
    }

    let index = Index::from_names(&names, &output.public_url);
    write(&output.index_path(), &index, compression).await?;
    if ping || config.ping.enabled {
        announce(config, &output.index_location()).await?;
    }
    Ok(())
}

/// Index every sitemap file already in the output folder.
pub async fn index(config: &Config, ping: bool) -> Result<()> {
    let output = &config.output;
    let compression = output.compression().or_raise(|| ErrorKind::Config)?;
    let backend = LocalBackend::new(&output.name, &output.folder).or_raise(|| ErrorKind::Index)?;
    let index = Index::scan(&backend, &output.index_file, &output.public_url, compression)
        .await
        .or_raise(|| ErrorKind::Index)?;
    if index.is_empty() {
        tracing::warn!(folder = %output.folder.display(), "No sitemap files found");
    }
    write(&output.index_path(), &index, compression).await?;
    if ping || config.ping.enabled {
        announce(config, &output.index_location()).await?;
    }
    Ok(())
}

pub async fn ping(config: &Config, index_url: Option<String>) -> Result<()> {
    let location = index_url.unwrap_or_else(|| config.output.index_location());
    announce(config, &location).await
}

/// Print the entries of a sitemap or sitemap index file.
pub async fn inspect(path: &Path) -> Result<()> {
    let failed = || ErrorKind::Inspect(path.to_path_buf());
    let file_name = path.file_name().ok_or_raise(failed)?;
    let folder = path.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let backend = LocalBackend::new("inspect", folder).or_raise(failed)?;
    let bytes = backend.read(Path::new(file_name)).await.or_raise(failed)?;
    let document = Compression::from_magic_bytes(&bytes).decompress(&bytes).or_raise(failed)?;
    match xml::decode_urlset(&document) {
        Ok(urls) => {
            for url in &urls {
                println!("{}", records::format_record(url));
            }
            tracing::info!(urls = urls.len(), "Sitemap");
        },
        Err(_) => {
            let index = xml::decode_index(&document).or_raise(failed)?;
            for sitemap in index.sitemaps() {
                println!("{}", records::format_sitemap(sitemap));
            }
            tracing::info!(sitemaps = index.len(), "Sitemap index");
        },
    }
    Ok(())
}

async fn write(path: &Path, index: &Index, compression: Compression) -> Result<()> {
    create_sitemap_index(path, index, compression).await.or_raise(|| ErrorKind::Index)?;
    println!("{}", path.display());
    Ok(())
}

async fn announce(config: &Config, index_location: &str) -> Result<()> {
    let timeout = config.ping.timeout();
    let notifier = match &config.ping.endpoints {
        Some(endpoints) => Notifier::new(endpoints.iter().cloned(), timeout),
        None => Notifier::new(DEFAULT_ENDPOINTS, timeout),
    }
    .or_raise(|| ErrorKind::Notify)?;
    let outcomes = notifier.ping(index_location).await;
    let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
    for outcome in &outcomes {
        println!("{}", describe(outcome));
    }
    tracing::info!(succeeded, failed = outcomes.len() - succeeded, "Pinged search engines");
    Ok(())
}

fn describe(outcome: &PingOutcome) -> String {
    match &outcome.result {
        Ok(status) => format!("{}\t{status}", outcome.endpoint),
        Err(err) => format!("{}\t{err}", outcome.endpoint),
    }
}
