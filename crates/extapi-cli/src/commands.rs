use anyhow::Context;
use colored::Colorize;

use extapi_server::{ExtApiServer, ServerConfig};
use extapi_store::{Fixture, InMemoryRecordStore, StoreStats};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Config(args) => cmd_config(args),
        Command::CheckFixture(args) => cmd_check_fixture(args),
    }
}

/// Load the config file if one was given, then apply flag overrides.
pub fn resolve_config(args: ConfigArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(fixture) = args.fixture {
        config.fixture = Some(fixture);
    }
    if let Some(max) = args.max_batch {
        anyhow::ensure!(max > 0, "--max-batch must be at least 1");
        config.batch.max_items = max;
    }
    tracing::debug!(
        bind = %config.bind_addr,
        fixture = ?config.fixture,
        max_batch = config.batch.max_items,
        "configuration resolved"
    );
    Ok(config)
}

fn cmd_serve(args: ConfigArgs) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    let server = ExtApiServer::from_config(config)?;
    println!(
        "{} extapi listening on {} (max batch {})",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.config().batch.max_items,
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn cmd_check_fixture(args: CheckFixtureArgs) -> anyhow::Result<()> {
    let stats = check_fixture(&args)?;
    println!("{} Fixture {} is valid", "✓".green().bold(), args.file.display().to_string().bold());
    for (label, count) in stat_lines(&stats) {
        println!("  {:<14} {}", label, count.to_string().cyan());
    }
    Ok(())
}

/// Load and apply a fixture to an empty store.
pub fn check_fixture(args: &CheckFixtureArgs) -> anyhow::Result<StoreStats> {
    let fixture = Fixture::load(&args.file)
        .with_context(|| format!("reading fixture {}", args.file.display()))?;
    let store = InMemoryRecordStore::new();
    fixture.apply(&store).context("fixture rejected")?;
    Ok(store.stats())
}

fn stat_lines(stats: &StoreStats) -> [(&'static str, usize); 8] {
    [
        ("users", stats.users),
        ("projects", stats.projects),
        ("issues", stats.issues),
        ("roles", stats.roles),
        ("members", stats.members),
        ("activities", stats.activities),
        ("trackers", stats.trackers),
        ("custom fields", stats.custom_fields),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_defaults() {
        let config = resolve_config(ConfigArgs {
            bind: Some("0.0.0.0:9000".parse().unwrap()),
            max_batch: Some(10),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.batch.max_items, 10);
        assert!(config.fixture.is_none());
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"127.0.0.1:4000\"\n[batch]\nmax_items = 5").unwrap();
        let config = resolve_config(ConfigArgs {
            config: Some(file.path().to_path_buf()),
            max_batch: Some(50),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config.bind_addr.port(), 4000);
        assert_eq!(config.batch.max_items, 50);
    }

    #[test]
    fn zero_max_batch_is_rejected() {
        let result = resolve_config(ConfigArgs { max_batch: Some(0), ..ConfigArgs::default() });
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = resolve_config(ConfigArgs {
            config: Some("/nonexistent/extapi.toml".into()),
            ..ConfigArgs::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn check_fixture_counts_records() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("seed.toml");
        std::fs::write(
            &file,
            r#"
[[users]]
id = 1
login = "admin"
admin = true

[[projects]]
id = 1
name = "Ops"

[[activities]]
id = 9
name = "Development"
"#,
        )
        .unwrap();
        let stats = check_fixture(&CheckFixtureArgs { file }).unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.projects, 1);
        assert_eq!(stats.activities, 1);
        assert_eq!(stats.issues, 0);
    }

    #[test]
    fn check_fixture_reports_broken_references() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("seed.toml");
        std::fs::write(&file, "[[issues]]\nid = 1\nproject_id = 7\nsubject = \"Orphan\"\n").unwrap();
        assert!(check_fixture(&CheckFixtureArgs { file }).is_err());
    }
}
