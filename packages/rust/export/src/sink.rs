//! Output sinks: plain or gzip-compressed files under the results directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use tracing::debug;

use resultforge_shared::{Fingerprint, Result, ResultForgeError};

/// Fixed banner embedded in the metadata of compressed output streams.
pub const PRODUCT_BANNER: &str = "Generated by ResultForge. https://resultforge.dev";

/// Extension used on disk when compression is enabled.
const GZIP_EXT: &str = "gz";

/// A byte sink for one export stream.
///
/// Output lands at `{results_dir}/{fingerprint}_{YYYY-MM-DD_HH:MM}.{ext}`;
/// with compression on, the on-disk extension becomes `gz` and the original
/// file name travels in the gzip header together with the product banner.
pub struct Sink {
    writer: SinkWriter,
    path: PathBuf,
}

enum SinkWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    /// Create the results directory on demand and open the output file.
    pub fn create(
        results_dir: &Path,
        fingerprint: &Fingerprint,
        extension: &str,
        compression: bool,
    ) -> Result<Self> {
        std::fs::create_dir_all(results_dir)
            .map_err(|e| ResultForgeError::io(results_dir, e))?;

        let timestamp = Local::now().format("%Y-%m-%d_%H:%M").to_string();
        let inner_name = format!("{fingerprint}_{timestamp}.{extension}");
        let file_name = if compression {
            format!("{fingerprint}_{timestamp}.{GZIP_EXT}")
        } else {
            inner_name.clone()
        };

        let path = results_dir.join(file_name);
        let file = File::create(&path).map_err(|e| ResultForgeError::io(&path, e))?;
        debug!(path = %path.display(), compression, "opened sink");

        let writer = if compression {
            SinkWriter::Gzip(
                GzBuilder::new()
                    .filename(inner_name.as_str())
                    .comment(PRODUCT_BANNER)
                    .write(BufWriter::new(file), Compression::fast()),
            )
        } else {
            SinkWriter::Plain(BufWriter::new(file))
        };

        Ok(Self { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all bytes, mapping failures to the sink path.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let result = match &mut self.writer {
            SinkWriter::Plain(w) => w.write_all(bytes),
            SinkWriter::Gzip(w) => w.write_all(bytes),
        };
        result.map_err(|e| ResultForgeError::io(&self.path, e))
    }

    /// Flush buffers and, for gzip, write the stream trailer.
    pub fn finish(self) -> Result<PathBuf> {
        let Self { writer, path } = self;
        match writer {
            SinkWriter::Plain(mut w) => {
                w.flush().map_err(|e| ResultForgeError::io(&path, e))?;
            }
            SinkWriter::Gzip(w) => {
                let mut inner = w.finish().map_err(|e| ResultForgeError::io(&path, e))?;
                inner.flush().map_err(|e| ResultForgeError::io(&path, e))?;
            }
        }
        Ok(path)
    }
}
