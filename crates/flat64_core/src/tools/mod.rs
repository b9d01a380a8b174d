//! External tool adapters.
//!
//! Every conversion is delegated to an external program:
//!
//! - **archives**: `unzip`, `unrar`, `gzip`, `tar`
//! - **cbm**: `cbmconvert` image modes and `zip2disk` merging
//! - **lister**: optional disk directory listing and its analysis
//!
//! All invocations go through [`run_tool`], which pins the working
//! directory per call and never touches the process-wide one. A failing
//! tool surfaces as a [`ToolError`] that the pipeline resolves by
//! policy, so one broken archive does not abort a whole run.

mod archives;
mod cbm;
mod lister;
mod runner;

// Re-export public types
pub use cbm::ImageMode;
pub use lister::DiskAnalysis;
pub use runner::{ToolError, ToolResult};

// Re-export public functions
pub use archives::{extract_gzip, extract_rar, extract_tar, extract_zip};
pub use cbm::{grouped_disk_name, lynx_to_disk, merge_grouped, unpack_image};
pub use lister::{analyze_listing, is_score_table_name, list_image, IMAGE_PLACEHOLDER};
pub use runner::run_tool;
