//! Generic tree traversal built from `list` and `stat`.
//!
//! No custom traversal optimization: every directory is expanded through
//! [`Driver::list`] and every entry described through [`Driver::stat`].
//! The walk is iterative (an explicit stack) so it needs no boxed async
//! recursion.

use crate::driver::{Driver, FileInfo};
use crate::error::{DriverError, DriverResult};

/// What the visitor wants the walk to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkDecision {
    /// Keep going; descend into directories.
    Continue,
    /// Do not descend into this directory. Ignored for files.
    SkipDir,
    /// Abort the whole walk.
    Stop,
}

impl Driver {
    /// Depth-first traversal of the namespace under `path`, calling
    /// `visit` on every file and directory below it (the starting path
    /// itself is not visited). Children are visited in sorted order.
    pub async fn walk<F>(&self, path: &str, visit: &mut F) -> DriverResult<()>
    where
        F: FnMut(&FileInfo) -> WalkDecision,
    {
        // LIFO stack of paths still to visit; children are pushed in
        // reverse so siblings come off sorted, giving preorder overall.
        let mut stack = self.list(path).await?;
        stack.reverse();

        while let Some(current) = stack.pop() {
            // A name surfaced by list with no object of its own is an
            // implicit directory: only its descendants are stored.
            let info = match self.stat(&current).await {
                Ok(info) => info,
                Err(DriverError::PathNotFound { .. }) => FileInfo {
                    path: current.clone(),
                    size: 0,
                    modified: None,
                    is_dir: true,
                },
                Err(err) => return Err(err),
            };

            match visit(&info) {
                WalkDecision::Stop => return Ok(()),
                WalkDecision::SkipDir => {}
                WalkDecision::Continue => {
                    if info.is_dir {
                        let mut children = self.list(&current).await?;
                        children.reverse();
                        stack.extend(children);
                    }
                }
            }
        }
        Ok(())
    }
}
