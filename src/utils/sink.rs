use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;

use super::outfile_path;

/// Where the output of a dump / ping / inspect batch goes.
///
/// Either the console or a single file shared by every unit of the batch.
pub struct Sink {
    writer: Box<dyn Write>,
    path: Option<PathBuf>,
}

impl Sink {
    pub fn console() -> Sink {
        Sink {
            writer: Box::new(io::stdout()),
            path: None,
        }
    }

    pub fn file(path: PathBuf) -> anyhow::Result<Sink> {
        let file = File::create(&path)
            .with_context(|| format!("failed to create output file '{}'", path.display()))?;
        Ok(Sink {
            writer: Box::new(BufWriter::new(file)),
            path: Some(path),
        })
    }

    /// Console, or a fresh `<kind>-outfile-<timestamp>.txt` in `dir`.
    pub fn open(dir: &Path, kind: &str, to_file: bool) -> anyhow::Result<Sink> {
        if to_file {
            Sink::file(outfile_path(dir, kind))
        } else {
            Ok(Sink::console())
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", text)
    }

    /// Command output, terminated by a newline if it has none.
    pub fn block(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        if !text.is_empty() && !text.ends_with('\n') {
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn finish(mut self, what: &str) -> io::Result<()> {
        self.writer.flush()?;
        if let Some(path) = self.path() {
            info!("{} output is written into {}", what, path.display());
        }
        Ok(())
    }
}
