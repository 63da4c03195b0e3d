//! Subcommand implementations.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use licence_finder_search::{
    DynTransport, IndexReport, SectorSearchClient, StaticTerms, TermsProvider,
};
use licence_finder_taxonomy::{InMemoryTaxonomyStore, SectorImporter};
use tracing::{info, warn};

use crate::config::{Cli, Command};

/// Builds a client from the arguments. `transport` overrides the engine
/// transport built from `--nodes`.
pub fn build_client(
    cli: &Cli,
    terms: Arc<dyn TermsProvider>,
    transport: Option<DynTransport>,
) -> anyhow::Result<SectorSearchClient> {
    let mut builder = SectorSearchClient::builder(cli.search_config()).terms(terms);
    if let Some(transport) = transport {
        builder = builder.transport(transport);
    }
    if let Some(deadline) = cli.deadline() {
        builder = builder.deadline(deadline);
    }
    builder.build().context("Invalid search configuration")
}

/// Runs the selected subcommand, writing results to `out`.
pub async fn run(
    cli: &Cli,
    transport: Option<DynTransport>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match &cli.command {
        Command::Reindex {
            sectors,
            extra_terms,
            alias,
        } => reindex(cli, transport, sectors, extra_terms.as_deref(), *alias, out).await,
        Command::Search { text } => {
            let client = build_client(cli, Arc::new(StaticTerms::new()), transport)?;
            let ids = client.search(&Cli::search_text(text)).await?;
            for id in ids {
                writeln!(out, "{}", id)?;
            }
            Ok(())
        }
        Command::DeleteIndex => {
            let client = build_client(cli, Arc::new(StaticTerms::new()), transport)?;
            client.delete_index().await?;
            writeln!(out, "Deleted index {}", client.index_name())?;
            Ok(())
        }
    }
}

async fn reindex(
    cli: &Cli,
    transport: Option<DynTransport>,
    sectors: &Path,
    extra_terms: Option<&Path>,
    alias: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let store = InMemoryTaxonomyStore::new();
    let summary = SectorImporter::new(&store)
        .import_path(sectors)
        .with_context(|| format!("Failed to import sectors from {}", sectors.display()))?;
    info!(
        rows = summary.rows,
        sectors = store.sector_count(),
        "Loaded sector taxonomy"
    );

    let terms = match extra_terms {
        Some(path) => StaticTerms::from_csv_path(path)
            .with_context(|| format!("Failed to load extra terms from {}", path.display()))?,
        None => StaticTerms::new(),
    };
    let client = build_client(cli, Arc::new(terms), transport)?;
    let records = store.sector_records();

    let report = if alias {
        let rebuilt = client.rebuild_behind_alias(&records).await?;
        writeln!(
            out,
            "Alias {} now points at {}",
            client.index_name(),
            rebuilt.index
        )?;
        for retired in &rebuilt.retired {
            writeln!(out, "Deleted previous index {}", retired)?;
        }
        for kept in &rebuilt.undeleted {
            writeln!(out, "Could not delete previous index {}", kept)?;
        }
        rebuilt.report
    } else {
        client.rebuild(&records).await?
    };

    finish(&report, out)
}

fn finish(report: &IndexReport, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(
        out,
        "Indexed {} sectors, {} failed",
        report.indexed(),
        report.failed()
    )?;
    if report.is_complete() {
        return Ok(());
    }
    for (public_id, error) in report.failures() {
        warn!(public_id, error = %error, "Sector not indexed");
    }
    anyhow::bail!("{} sectors failed to index", report.failed())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use licence_finder_search::MemoryTransport;

    use super::*;

    const SECTORS: &str = "\
LAYER1_OID,LAYER_1_TAX_CODE,LAYER1,LAYER2_OID,LAYER_2_TAX_CODE,LAYER2,LAYER3_OID,LAYER_3_TAX_CODE,LAYER3
1000001,A0,\"Agriculture, forestry and fishing\",1000002,A0.010,Agriculture,1000011,A0.010.090,Animal farming support services
";

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["licence-search", "--index", "test-index"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    async fn run_to_string(cli: &Cli, transport: Arc<MemoryTransport>) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run(cli, Some(transport), &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_reindex_then_search() {
        let dir = tempfile::tempdir().unwrap();
        let sectors = dir.path().join("sectors.csv");
        let terms = dir.path().join("terms.csv");
        fs::write(&sectors, SECTORS).unwrap();
        fs::write(&terms, "correlation_id,term\n1000011,livestock\n").unwrap();

        let transport = Arc::new(MemoryTransport::new());
        let reindex = cli(&[
            "reindex",
            "--sectors",
            sectors.to_str().unwrap(),
            "--extra-terms",
            terms.to_str().unwrap(),
        ]);
        let output = run_to_string(&reindex, transport.clone()).await.unwrap();
        assert_eq!(output, "Indexed 3 sectors, 0 failed\n");
        assert_eq!(transport.document_count("test-index"), 3);

        let output = run_to_string(&cli(&["search", "livestock"]), transport.clone())
            .await
            .unwrap();
        let leaf = transport
            .document("test-index", "3")
            .map(|doc| doc["title"].clone());
        assert_eq!(output, "3\n");
        assert_eq!(
            leaf,
            Some(serde_json::json!("Animal farming support services"))
        );
    }

    #[tokio::test]
    async fn test_reindex_behind_alias() {
        let dir = tempfile::tempdir().unwrap();
        let sectors = dir.path().join("sectors.csv");
        fs::write(&sectors, SECTORS).unwrap();

        let transport = Arc::new(MemoryTransport::new());
        let reindex = cli(&["reindex", "--sectors", sectors.to_str().unwrap(), "--alias"]);
        let output = run_to_string(&reindex, transport.clone()).await.unwrap();

        assert!(output.starts_with("Alias test-index now points at test-index-"));
        assert!(output.ends_with("Indexed 3 sectors, 0 failed\n"));
        assert!(!transport.index_exists("test-index"));
    }

    #[tokio::test]
    async fn test_delete_index_after_aliased_reindex() {
        let dir = tempfile::tempdir().unwrap();
        let sectors = dir.path().join("sectors.csv");
        fs::write(&sectors, SECTORS).unwrap();

        let transport = Arc::new(MemoryTransport::new());
        let reindex = cli(&["reindex", "--sectors", sectors.to_str().unwrap(), "--alias"]);
        run_to_string(&reindex, transport.clone()).await.unwrap();

        let output = run_to_string(&cli(&["delete-index"]), transport.clone())
            .await
            .unwrap();
        assert_eq!(output, "Deleted index test-index\n");
        assert!(transport.index_names().is_empty());

        let reindex = cli(&["reindex", "--sectors", sectors.to_str().unwrap()]);
        let output = run_to_string(&reindex, transport.clone()).await.unwrap();
        assert_eq!(output, "Indexed 3 sectors, 0 failed\n");
        assert!(transport.index_exists("test-index"));
    }

    #[tokio::test]
    async fn test_reindex_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let sectors = dir.path().join("sectors.csv");
        fs::write(&sectors, SECTORS).unwrap();

        let transport = Arc::new(MemoryTransport::new());
        transport.fail_writes_for("2");
        let reindex = cli(&["reindex", "--sectors", sectors.to_str().unwrap()]);
        let err = run_to_string(&reindex, transport).await.unwrap_err();
        assert_eq!(err.to_string(), "1 sectors failed to index");
    }

    #[tokio::test]
    async fn test_reindex_missing_sectors_file() {
        let transport = Arc::new(MemoryTransport::new());
        let reindex = cli(&["reindex", "--sectors", "/example/sectors.csv"]);
        let err = run_to_string(&reindex, transport.clone()).await.unwrap_err();
        assert!(err.to_string().contains("/example/sectors.csv"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_index_without_index() {
        let transport = Arc::new(MemoryTransport::new());
        let output = run_to_string(&cli(&["delete-index"]), transport)
            .await
            .unwrap();
        assert_eq!(output, "Deleted index test-index\n");
    }

    #[tokio::test]
    async fn test_search_without_matches_prints_nothing() {
        let transport = Arc::new(MemoryTransport::new());
        let output = run_to_string(&cli(&["search", "nothing"]), transport)
            .await
            .unwrap();
        assert!(output.is_empty());
    }
}
