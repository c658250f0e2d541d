// Primitives for reading the ballot text files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use party_list::builder::Builder;

use crate::plv::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads all the ballot files into a single election, in order.
pub fn read_ballot_files(paths: &[String]) -> BPlvResult<Election> {
    if paths.is_empty() {
        return Err(Box::new(PlvError::NoBallotFile {}));
    }
    let mut builder = Builder::new();
    for path in paths.iter() {
        info!("Attempting to read ballot file {:?}", path);
        let file = File::open(path).context(OpeningFileSnafu { path })?;
        let count = builder
            .ingest(BufReader::new(file))
            .context(ReadingBallotsSnafu {
                path: simplify_file_name(path),
            })?;
        debug!(
            "read_ballot_files: {}: {} ballots",
            simplify_file_name(path),
            count
        );
    }
    let election = builder.build().context(ElectionSnafu {})?;
    Ok(election)
}
