use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Header row of the export file.
pub const CSV_HEADER: &str = "Reaction Time (ms)";

/// Writes the flat tabular export: the header, then one reaction time per
/// row in recorded order. Errors propagate to the caller; the data is only
/// considered saved when this returns Ok.
pub fn write_reaction_times<W: Write>(mut w: W, reaction_times_ms: &[u64]) -> io::Result<()> {
    writeln!(w, "{}", CSV_HEADER)?;
    for reaction_ms in reaction_times_ms {
        writeln!(w, "{}", reaction_ms)?;
    }
    w.flush()
}

/// Creates (or truncates) `path` and writes the export into it.
pub fn export_to_path<P: AsRef<Path>>(path: P, reaction_times_ms: &[u64]) -> io::Result<()> {
    let file = File::create(path)?;
    write_reaction_times(BufWriter::new(file), reaction_times_ms)
}
