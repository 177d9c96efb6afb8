//! **cultist-circle** - picks the cheapest Cultist Circle sacrifice from OCR'd inventory text
//!
//! Noisy scanned labels are normalized, matched against a price catalog, and fed to a
//! bounded exhaustive search over at most five ritual slots.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core engine - tokenizing, matching, and combination search
pub mod core {
    /// Token splitting and label canonicalization
    pub mod text;
    pub use text::{NormalizedLabel, normalize, tokenize};

    /// Built-in and user-supplied OCR alias table
    pub mod alias;
    pub use alias::{AliasError, AliasTable};

    /// Item records and the loaded price catalog
    pub mod catalog;
    pub use catalog::{Catalog, ItemId, ItemRecord};

    /// Label lookup and inventory aggregation
    pub mod matcher;
    pub use matcher::{MatchReport, MatchedInventoryEntry, match_tokens};

    /// Branch-and-bound combination search
    pub mod selector;
    pub use selector::{CancelToken, ComboResult, SelectError, Selector, select_best};

    /// Background selection with last-submitted-wins publishing
    pub mod session;
    pub use session::{Dispatcher, SelectionJob, Settlement};
}

/// Infrastructure - Configuration, I/O, and utilities
pub mod infra {
    /// Configuration management with TOML/YAML/JSON files and env overrides
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Catalog, alias, and scan text loading (memory-mapped above 1 MiB)
    pub mod io;
    pub use io::{FileContent, load_alias_file, load_catalog, read_file_smart};

    /// Number and plural formatting
    pub mod utils;
}

/// Subcommand handlers and output rendering
pub mod cli_ext {
    /// Text, table, and JSON views of match and selection results
    pub mod report;
    pub use report::{MatchSummary, ScanReport, SelectionStatus};

    /// `scan`, `match`, and `normalize` handlers
    pub mod scan_cmd;
    pub use scan_cmd::{match_run, normalize_run, scan_run};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use cli_ext::{match_run, normalize_run, scan_run};
pub use infra::{Config, load_config};

// Core types for external consumers
pub use core::{Catalog, ComboResult, ItemRecord, MatchedInventoryEntry, select_best};
