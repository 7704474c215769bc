//! Inputs that are acquired before a traversal and released after it

use std::fs::File;
use std::io::{self, Cursor, Read, Stdin};
use std::path::Path;

use log::warn;

use crate::config::Config;
use crate::error::Error;
use crate::normalize::{Normalizer, Outcome};

/// A byte stream with an explicit release step
///
/// Files, standard input and in-memory buffers are released on drop and
/// have nothing to report, so their `close` always succeeds. An error from
/// `close` comes only from sources whose release can fail, such as a
/// child process that must be waited on or a socket that must be shut down.
pub trait Source: Read {
    fn close(self) -> io::Result<()>;
}

// `File` reports no error when dropped
impl Source for File {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Source for Stdin {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Source for &[u8] {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: AsRef<[u8]>> Source for Cursor<T> {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

/// Run one session over `source`, then release it whatever happened
pub fn parse_source<S: Source>(mut source: S, config: Config) -> Outcome {
    let mut outcome = Normalizer::new(config).parse(&mut source);

    if let Err(e) = source.close() {
        warn!("failed to close input: {}", e);
        outcome.set_close_failure(Error::ResourceClose(e));
    }

    outcome
}

/// Open the file at `path` and normalize it
pub fn parse_path<P: AsRef<Path>>(path: P, config: Config) -> Outcome {
    let path = path.as_ref();
    match File::open(path) {
        Ok(file) => parse_source(file, config),
        Err(e) => {
            warn!("failed to open {}: {}", path.display(), e);
            Outcome::failed(Error::Open {
                path: path.to_owned(),
                source: e,
            })
        }
    }
}
