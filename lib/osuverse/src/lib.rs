//! Scanning, metadata extraction and relocation of osu! beatmap folders.

pub mod collate;
pub mod config;
pub mod error;
pub mod parser;
pub mod relocation;
pub mod scanner;
pub mod walker;

pub use config::{ScanConfig, WalkOptions};
pub use error::{ParseError, RelocationError, ScanError};
pub use parser::{parse_descriptor, DescriptorMetadata};
pub use relocation::{relocate, MoveContext, MoveFailure, MoveOutcome, MovePolicy};
pub use scanner::{ScanContext, ScanEvent, ScanHandle, ScanReport, Scanner};
pub use shared::beatmap::Beatmap;
pub use walker::{find_descriptors, DescriptorFile, Discovery};
