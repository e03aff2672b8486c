//! nlip command implementations.

pub mod address;
pub mod route;

use std::io::Write;

use serde::Serialize;

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub pretty: bool,
}

impl Output {
    /// Write `value` as a single JSON document followed by a newline.
    pub fn write_json<W: Write, T: Serialize + ?Sized>(&self, w: &mut W, value: &T) -> anyhow::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *w, value)?;
        } else {
            serde_json::to_writer(&mut *w, value)?;
        }
        writeln!(w)?;
        Ok(())
    }
}

/// Interface name for `index`, or the index itself when unknown.
pub fn ifname_or_index(index: u32) -> String {
    nlroute::util::index_to_name(index).unwrap_or_else(|_| index.to_string())
}
