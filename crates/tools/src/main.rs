use std::path::PathBuf;

use clap::{Parser, Subcommand};
use runtime::Diagnostics;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mapkit",
    about = "Tile grids, WKT, feature styles and view fits from the command line"
)]
struct Cli {
    /// Map options as JSON (camelCase keys). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the tile matrix set for a projection extent.
    TileMatrix {
        /// `min_x,min_y,max_x,max_y`
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        extent: Vec<f64>,
        #[arg(long)]
        tile_size: Option<u32>,
        /// Defaults to the configured maxZoom.
        #[arg(long)]
        zoom_levels: Option<u32>,
    },
    /// Convert between WKT and GeoJSON geometries.
    Wkt {
        #[command(subcommand)]
        action: WktAction,
    },
    /// Resolve the style of every feature in a GeoJSON FeatureCollection.
    Style {
        input: PathBuf,
        /// Id of the feature to highlight (JSON literal or plain string).
        #[arg(long)]
        highlight: Option<String>,
    },
    /// Highlight a feature and print the camera move that frames it.
    Fit {
        input: PathBuf,
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum WktAction {
    /// WKT of each feature in a GeoJSON FeatureCollection, one per line.
    Encode { input: PathBuf },
    /// GeoJSON geometry for a WKT string.
    Decode { text: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> Result<(), String> {
    let cfg = tools::load_config(cli.config.as_deref())?;
    let mut diagnostics = Diagnostics::new();

    match cli.command {
        Command::TileMatrix {
            extent,
            tile_size,
            zoom_levels,
        } => {
            let extent: [f64; 4] = extent
                .try_into()
                .map_err(|_| "--extent takes exactly four numbers".to_string())?;
            print_json(&tools::tile_matrix(&cfg, extent, tile_size, zoom_levels)?)?;
        }
        Command::Wkt {
            action: WktAction::Encode { input },
        } => {
            for line in tools::encode_wkt(&tools::read_features(&input)?)? {
                println!("{line}");
            }
        }
        Command::Wkt {
            action: WktAction::Decode { text },
        } => print_json(&tools::decode_wkt(&text)?)?,
        Command::Style { input, highlight } => {
            let features = tools::read_features(&input)?;
            let target = highlight.as_deref().map(tools::parse_id);
            let out = tools::styles(&cfg, &features, target.as_ref(), &mut diagnostics)?;
            print_json(&out)?;
        }
        Command::Fit { input, id } => {
            let features = tools::read_features(&input)?;
            let step = tools::fit(&cfg, &features, &tools::parse_id(&id), &mut diagnostics)?;
            print_json(&step)?;
        }
    }

    if !diagnostics.is_empty() {
        eprintln!("{} diagnostic(s) recorded", diagnostics.entries().len());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}
