use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use entimap::{
    Engine, IndexedParams, MemoryStatement, NamedParam, NamedStatement, PreparedStatement, Record,
    parse_entity,
};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "entimap-tool")]
#[command(about = "Developer tooling for entity mappings, normalization and parameter binding")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print (or write) the mapping XML of entity sources
    Compile {
        files: Vec<PathBuf>,
        /// Write `<Entity>.hbm.xml` files here instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print parsed entity metadata as JSON
    Inspect { file: PathBuf },
    /// Normalize a JSON record and print the typed result
    Normalize {
        #[arg(long)]
        entities: Option<PathBuf>,
        #[arg(long)]
        entity: Option<String>,
        record: PathBuf,
    },
    /// Bind a JSON parameter payload against SQL and print the bound parameters
    Bind {
        #[arg(long)]
        entities: PathBuf,
        #[arg(long)]
        entity: String,
        #[arg(long)]
        sql: String,
        params: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compile { files, out } => compile(&files, out.as_deref()),
        Command::Inspect { file } => inspect(&file),
        Command::Normalize {
            entities,
            entity,
            record,
        } => normalize(entities.as_deref(), entity.as_deref(), &record),
        Command::Bind {
            entities,
            entity,
            sql,
            params,
        } => bind(&entities, &entity, &sql, &params),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let text = read_source(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in '{}'", path.display()))
}

fn engine_with(entities: &Path) -> Result<Engine> {
    let engine = Engine::new();
    let report = engine
        .load_dir(entities)
        .with_context(|| format!("Failed to load entities from '{}'", entities.display()))?;
    for (path, err) in &report.failures {
        eprintln!("skipped {}: {}", path.display(), err);
    }
    Ok(engine)
}

fn compile(files: &[PathBuf], out: Option<&Path>) -> Result<()> {
    if files.is_empty() {
        bail!("No entity sources given");
    }

    let engine = Engine::new();
    for file in files {
        let source = read_source(file)?;
        let metadata = engine.register_source(&file.display().to_string(), &source)?;
        let xml = engine.mapping_xml(&metadata.entity_name)?;

        match out {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create '{}'", dir.display()))?;
                let target = dir.join(format!("{}.hbm.xml", metadata.entity_name));
                fs::write(&target, xml)
                    .with_context(|| format!("Failed to write '{}'", target.display()))?;
                println!("Wrote {}", target.display());
            }
            None => print!("{}", xml),
        }
    }
    Ok(())
}

fn inspect(file: &Path) -> Result<()> {
    let source = read_source(file)?;
    let metadata = parse_entity(&file.display().to_string(), &source)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

fn normalize(entities: Option<&Path>, entity: Option<&str>, record: &Path) -> Result<()> {
    let json = read_json(record)?;
    let object = json
        .as_object()
        .ok_or_else(|| anyhow!("'{}' must contain a JSON object", record.display()))?;
    let mut record: Record = entimap::core::record_from_json(object);

    match (entities, entity) {
        (Some(dir), Some(name)) => {
            let engine = engine_with(dir)?;
            engine.normalize_for_entity(&mut record, name)?;
            println!("{}", serde_json::to_string_pretty(&engine.to_external(&record))?);
        }
        (None, Some(_)) => bail!("--entity needs --entities <dir>"),
        _ => {
            let engine = Engine::new();
            engine.normalize(&mut record);
            println!("{}", serde_json::to_string_pretty(&engine.to_external(&record))?);
        }
    }
    Ok(())
}

fn bind(entities: &Path, entity: &str, sql: &str, params: &Path) -> Result<()> {
    let engine = engine_with(entities)?;
    let payload = read_json(params)?;

    let is_named = payload
        .as_array()
        .and_then(|items| items.first())
        .is_some_and(|first| first.get("name").is_some() && first.get("type").is_some());

    let statement = if is_named {
        let named_sql = engine.prepare_named(sql)?;
        let metadata = engine.parameter_metadata(entity, named_sql.sql())?;
        let statement = MemoryStatement::from_metadata(metadata).with_sql(named_sql.sql());
        let mut named = NamedStatement::new(named_sql, statement)?;
        engine.bind_named(&NamedParam::list_from_json(&payload)?, &mut named)?;
        named.into_inner()
    } else {
        let metadata = engine.parameter_metadata(entity, sql)?;
        let mut statement = MemoryStatement::from_metadata(metadata).with_sql(sql);
        engine.bind_indexed(IndexedParams::from_json(&payload)?.values(), &mut statement)?;
        statement
    };

    for index in 1..=statement.parameter_count() {
        println!(
            "{} {}: {:?}",
            index,
            statement.parameter_type(index)?,
            statement.bound(index)
        );
    }
    Ok(())
}
