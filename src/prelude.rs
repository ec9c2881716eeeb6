//! The `dirbundle` prelude for convenient library usage.
//!
//! Re-exports the types and functions most programs need to combine and
//! split bundles.
//!
//! # Example
//!
//! ```no_run
//! use dirbundle::prelude::*;
//! # fn main() -> Result<()> {
//!
//! let config = ConfigBuilder::new()
//!     .source(".")
//!     .output_file("bundle.md")
//!     .separator_style("markdown")
//!     .build()?;
//! let token = CancellationToken::new();
//! let result = combine(&config, &token, None, &DenyOverwrite)?;
//! println!("{} file(s) bundled", result.files_processed);
//!
//! split(&SplitConfig::new("bundle.md", "restored"))?;
//! # Ok(())
//! # }
//! ```

pub use crate::cancellation::CancellationToken;
pub use crate::config::{Config, ConfigBuilder, SplitConfig, TimestampMode};
pub use crate::core_types::{ExtractionResult, FileRole, ProcessingResult, SourceFile};
pub use crate::encoding::Charset;
pub use crate::errors::{Error, Result};
pub use crate::output::{AllowOverwrite, DenyOverwrite, OverwritePrompt};
pub use crate::progress::{LogProgress, NoOpProgress, ProgressReporter};
pub use crate::security::SecurityMode;
pub use crate::separator::{LineEnding, SeparatorStyle};
pub use crate::{combine, plan, split};
