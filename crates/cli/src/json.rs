use std::io;

use serde::Serialize;

use clonescan_core::{CodeClone, Statistic};

#[derive(Serialize)]
pub(crate) struct JsonClones<'a> {
    pub(crate) clones: &'a [CodeClone],
}

#[derive(Serialize)]
pub(crate) struct JsonReport<'a> {
    pub(crate) clones: &'a [CodeClone],
    pub(crate) statistic: &'a Statistic,
}

pub(crate) fn write_json<T: Serialize>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::other(format!("json encode: {e}")))?;
    println!("{json}");
    Ok(())
}
