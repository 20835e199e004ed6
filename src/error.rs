use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
};
use thiserror::Error;

pub type MafxResult<T> = std::result::Result<T, MafxError>;

#[derive(Debug, Error)]
pub enum MafxError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error("No organism name in MAF component, source must be org.seq: {src}")]
    MissingSourceOrg { src: String },
    #[error("Block is already owned by an alignment set")]
    BlockAlreadyOwned,
    #[error("Block is not owned by this alignment set")]
    BlockNotOwned,
    #[error("No live index slot found for component {comp} of a removed block")]
    IndexSlotMissing { comp: String },
    #[error(
        "Conflicting length for sequence {org}.{name}: cataloged as {cataloged}, got {got}"
    )]
    SeqSizeConflict {
        org: String,
        name: String,
        cataloged: i64,
        got: i64,
    },
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
}

impl MafxError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[macro_export]
macro_rules! mafx_error {
    ($($arg:tt)*) => {
        $crate::error::MafxError::message(format!($($arg)*))
    };
}
