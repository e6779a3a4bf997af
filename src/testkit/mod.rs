//! In-memory collaborators for tests.
//!
//! - [`MockVcs`]: a [`VcsAdapter`](crate::vcs::VcsAdapter) serving revision
//!   lists and file contents from memory
//! - [`MockRunner`]: a [`ProcessRunner`](crate::process::ProcessRunner) whose
//!   "analyzer" answers with canned reports keyed by the source it was fed
//!
//! Both count their calls so tests can assert that a cached run never touched
//! version control or the analyzer.
//!
//! ```rust
//! use codetrend::testkit::{MockRunner, MockVcs};
//!
//! let vcs = MockVcs::new().with_content("123", "abs.rb", "def abs(a,b)\nend");
//! let runner = MockRunner::new().with_output_for("def abs(a,b)\nend", "\t2.0: flog total\n");
//! assert_eq!(vcs.show_count(), 0);
//! assert_eq!(runner.spawn_count(), 0);
//! ```

mod mock_runner;
mod mock_vcs;

pub use mock_runner::MockRunner;
pub use mock_vcs::MockVcs;
