//! JSON readers for cell layouts, configurations and events.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use calocluster_algorithms::{ClusteringConfig, GeometryContext};
use calocluster_core::{CellId, Hit};

use crate::{CliError, Result};

/// One entry of a layout file.
#[derive(Debug, Deserialize)]
struct CellPosition {
    module: u32,
    cell: u32,
    x: f64,
    y: f64,
}

/// One line of an events file.
#[derive(Debug, Deserialize)]
struct Event {
    hits: Vec<Hit>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a layout file and builds its neighbor graph.
pub(crate) fn load_layout(path: &Path) -> Result<GeometryContext> {
    let cells: Vec<CellPosition> = read_json(path)?;
    log::debug!("read {} cells from {}", cells.len(), path.display());
    let geometry = GeometryContext::build(
        cells
            .into_iter()
            .map(|c| (CellId::new(c.module, c.cell), (c.x, c.y))),
    )?;
    Ok(geometry)
}

/// Reads a clustering configuration. Missing fields take their defaults.
pub(crate) fn load_config(path: &Path) -> Result<ClusteringConfig> {
    read_json(path)
}

/// Streams events from a JSON-lines file. Blank lines are skipped.
///
/// Yields `(event index, hits)`; the index counts events, not lines.
pub(crate) struct EventReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    index: usize,
}

impl EventReader {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line: 0,
            index: 0,
        })
    }
}

impl Iterator for EventReader {
    type Item = Result<(usize, Vec<Hit>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(err) => return Some(Err(err.into())),
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<Event>(&text).map_err(|source| CliError::Event {
                path: self.path.clone(),
                line: self.line,
                source,
            });
            let index = self.index;
            self.index += 1;
            return Some(parsed.map(|event| (index, event.hits)));
        }
    }
}
