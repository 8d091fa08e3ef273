//! Command-line query front end.
//!
//! Reads points from a text file (one `x y z` triple per line, `#` comments),
//! queries one or more models in order, and writes one line per point with
//! the input coordinates followed by the requested values. Points no model
//! contains get the no-data marker.

use anyhow::{bail, Context, Result};
use clap::Parser;
use geogrids::{FileMode, Model, NODATA_VALUE};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geogrids-query", version, about = "Query georeferenced earth models")]
struct Args {
    /// Model containers to query, in order of precedence
    #[arg(long, required = true, num_args = 1.., value_delimiter = ',')]
    models: Vec<PathBuf>,

    /// Input file with one "x y z" point per line
    #[arg(long)]
    points: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// CRS of the input points
    #[arg(long, default_value = geogrids::DEFAULT_INPUT_CRS)]
    input_crs: String,

    /// Subset and order of values to report (default: all values of the
    /// first model, in storage order)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    values: Vec<String>,

    /// Log filter, e.g. "info" or "geogrids=debug"
    #[arg(long = "log-level", default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut models = Vec::with_capacity(args.models.len());
    for path in &args.models {
        let mut model = Model::new();
        model
            .open_path(path, FileMode::ReadOnly)
            .with_context(|| format!("opening model {}", path.display()))?;
        model
            .load_metadata()
            .with_context(|| format!("loading metadata of {}", path.display()))?;
        model.set_input_crs(&args.input_crs);
        model
            .initialize()
            .with_context(|| format!("initializing {}", path.display()))?;
        tracing::info!(model = %path.display(), values = model.value_names().len(), "model ready");
        models.push(model);
    }

    let value_names: Vec<String> = if args.values.is_empty() {
        models[0].value_names().to_vec()
    } else {
        args.values.clone()
    };
    // Per-model value indices, resolved once.
    let mut value_indices = Vec::with_capacity(models.len());
    for (model, path) in models.iter().zip(&args.models) {
        value_indices.push(resolve_values(model, &value_names).with_context(|| {
            format!("resolving requested values against {}", path.display())
        })?);
    }

    let points = File::open(&args.points)
        .with_context(|| format!("opening points file {}", args.points.display()))?;
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    writeln!(writer, "# x y z {}", value_names.join(" "))?;

    let mut misses = 0usize;
    for (lineno, line) in BufReader::new(points).lines().enumerate() {
        let line = line?;
        let text = line.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let point = parse_point(text)
            .with_context(|| format!("{}:{}: malformed point", args.points.display(), lineno + 1))?;

        let values = query_first(&models, &value_indices, point).with_context(|| {
            format!(
                "querying point ({}, {}, {})",
                point[0], point[1], point[2]
            )
        })?;
        if values.is_none() {
            misses += 1;
            tracing::debug!(x = point[0], y = point[1], z = point[2], "no model contains point");
        }
        let values =
            values.unwrap_or_else(|| vec![NODATA_VALUE; value_names.len()]);

        write!(writer, "{:14.6e} {:14.6e} {:14.6e}", point[0], point[1], point[2])?;
        for value in values {
            write!(writer, " {value:14.6e}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    if misses > 0 {
        tracing::warn!(misses, "points outside all models");
    }
    Ok(())
}

fn parse_point(text: &str) -> Result<[f64; 3]> {
    let mut fields = text.split_whitespace();
    let mut point = [0.0; 3];
    for slot in point.iter_mut() {
        let field = fields.next().context("expected 3 coordinates")?;
        *slot = field.parse().with_context(|| format!("bad coordinate '{field}'"))?;
    }
    if fields.next().is_some() {
        bail!("expected 3 coordinates");
    }
    Ok(point)
}

/// Map requested value names to their storage indices in one model.
fn resolve_values(model: &Model, names: &[String]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            model
                .value_names()
                .iter()
                .position(|stored| stored.eq_ignore_ascii_case(name))
                .with_context(|| format!("model stores no value named '{name}'"))
        })
        .collect()
}

/// Answer from the first model containing the point, reordered to the
/// requested values.
///
/// Only a point outside a model counts as a miss; any other failure (such as
/// a model whose blocks do not cover the point's depth) is an error, so a
/// corrupt model is distinguishable from a point outside all models.
fn query_first(
    models: &[Model],
    indices: &[Vec<usize>],
    point: [f64; 3],
) -> geogrids::Result<Option<Vec<f64>>> {
    for (model, indices) in models.iter().zip(indices) {
        match model.query(point[0], point[1], point[2]) {
            Ok(all) => return Ok(Some(indices.iter().map(|&i| all[i]).collect())),
            Err(geogrids::GridError::OutOfBounds(_)) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}
