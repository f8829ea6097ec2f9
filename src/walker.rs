//! Depth-first walk over the personal drive and every shared drive.
//!
//! The walk is driven by an explicit stack of frames instead of
//! recursion, so folder nesting depth is bounded only by memory. One
//! failing node (inaccessible folder, malformed permission) is logged and
//! counted; the walk then moves on to its siblings.

use std::io::Write;

use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::client::DriveApi;
use crate::config::AuditConfig;
use crate::error::Result;
use crate::models::FileMetadata;
use crate::resolver::{render_lines, resolve_permissions, INDENT_WIDTH, ROOT_ID};

/// Path under which the personal drive root's own grants are recorded.
pub const MY_DRIVE_ROOT_PATH: &str = "/";

/// Counters reported at the end of a walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub items_visited: usize,
    pub grants_recorded: usize,
    pub failures: usize,
}

/// Pending node of the walk.
struct Frame {
    item: FileMetadata,
    depth: usize,
    prefix: String,
}

/// Walks drives, prints the indented report to `out` and records every
/// effective grant.
pub struct Walker<'a, A: DriveApi + ?Sized, W: Write> {
    api: &'a A,
    out: W,
    log: AuditLog,
    root_owner: Option<String>,
    summary: WalkSummary,
}

impl<'a, A: DriveApi + ?Sized, W: Write> Walker<'a, A, W> {
    pub fn new(api: &'a A, out: W) -> Self {
        Self {
            api,
            out,
            log: AuditLog::new(),
            root_owner: None,
            summary: WalkSummary::default(),
        }
    }

    /// Consume the walker, returning what it found.
    pub fn finish(self) -> (AuditLog, WalkSummary) {
        (self.log, self.summary)
    }

    /// Walk the personal drive: the root's own grants, then its tree.
    pub async fn walk_my_drive(&mut self) -> Result<()> {
        writeln!(self.out, "My Drive")?;

        self.root_owner = match self.api.root_owner().await {
            Ok(owner) => owner,
            Err(e) => {
                warn!(error = %e, "could not determine the personal drive owner");
                self.summary.failures += 1;
                None
            }
        };
        info!(owner = ?self.root_owner, "walking personal drive");

        let root_ok = self.visit_node(ROOT_ID, MY_DRIVE_ROOT_PATH, 0, false).await?;
        if !root_ok {
            return Ok(());
        }

        match self.api.list_children(ROOT_ID, None).await {
            Ok(items) => self.walk(items, 1, String::new(), None).await,
            Err(e) => {
                warn!(path = MY_DRIVE_ROOT_PATH, error = %e, "failed to list folder");
                self.summary.failures += 1;
                Ok(())
            }
        }
    }

    /// Walk every shared drive: each drive's own grants, then its tree.
    pub async fn walk_shared_drives(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Shared drives")?;

        let drives = match self.api.list_shared_drives().await {
            Ok(drives) => drives,
            Err(e) => {
                warn!(error = %e, "failed to list shared drives");
                self.summary.failures += 1;
                return Ok(());
            }
        };

        for drive in drives {
            info!(drive = %drive.name, id = %drive.id, "walking shared drive");
            writeln!(self.out)?;

            if !self.visit_node(&drive.id, &drive.name, 0, true).await? {
                continue;
            }

            match self.api.list_children(&drive.id, Some(drive.id.as_str())).await {
                Ok(items) => {
                    let prefix = format!("{}/", drive.name);
                    self.walk(items, 1, prefix, Some(drive.id.as_str())).await?;
                }
                Err(e) => {
                    warn!(path = %drive.name, error = %e, "failed to list shared drive");
                    self.summary.failures += 1;
                }
            }
        }

        Ok(())
    }

    /// Walk `items` and everything below them in pre-order, keeping the
    /// server's sibling order.
    pub async fn walk(
        &mut self,
        items: Vec<FileMetadata>,
        depth: usize,
        prefix: String,
        drive_id: Option<&str>,
    ) -> Result<()> {
        let mut stack: Vec<Frame> = Vec::new();
        push_children(&mut stack, items, depth, &prefix);

        while let Some(frame) = stack.pop() {
            let mut path = format!("{}{}", frame.prefix, frame.item.name);
            if frame.item.is_folder() {
                path.push('/');
            }

            if !self.visit_node(&frame.item.id, &path, frame.depth, false).await? {
                continue;
            }
            if !frame.item.is_folder() {
                continue;
            }

            match self.api.list_children(&frame.item.id, drive_id).await {
                Ok(children) => push_children(&mut stack, children, frame.depth + 1, &path),
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to list folder");
                    self.summary.failures += 1;
                }
            }
        }

        Ok(())
    }

    /// Resolve, print and record the grants of one node. The path line is
    /// printed only when the node has grants, unless `heading` is set.
    /// Returns `false` when the node failed and its subtree should be
    /// skipped; only report output errors are propagated.
    async fn visit_node(&mut self, id: &str, path: &str, depth: usize, heading: bool) -> Result<bool> {
        self.summary.items_visited += 1;
        let indent = depth * INDENT_WIDTH;
        if heading {
            writeln!(self.out, "{}{}", " ".repeat(indent), path)?;
        }

        let grants =
            match resolve_permissions(self.api, id, path, self.root_owner.as_deref()).await {
                Ok(grants) => grants,
                Err(e) => {
                    warn!(path, id, error = %e, "failed to resolve permissions");
                    self.summary.failures += 1;
                    return Ok(false);
                }
            };

        if !grants.is_empty() {
            if !heading {
                writeln!(self.out, "{}{}", " ".repeat(indent), path)?;
            }
            writeln!(self.out, "{}", render_lines(&grants, indent + INDENT_WIDTH))?;
        }

        self.summary.grants_recorded += grants.len();
        for grant in grants {
            self.log.record(grant);
        }
        Ok(true)
    }
}

fn push_children(stack: &mut Vec<Frame>, items: Vec<FileMetadata>, depth: usize, prefix: &str) {
    // Reversed so the first sibling is popped first.
    stack.extend(items.into_iter().rev().map(|item| Frame {
        item,
        depth,
        prefix: prefix.to_string(),
    }));
}

/// Walk the drives selected by `config`, writing the text report to `out`.
pub async fn run_audit<A, W>(api: &A, config: &AuditConfig, out: W) -> Result<(AuditLog, WalkSummary)>
where
    A: DriveApi + ?Sized,
    W: Write,
{
    let mut walker = Walker::new(api, out);
    if config.include_my_drive {
        walker.walk_my_drive().await?;
    }
    if config.include_shared_drives {
        walker.walk_shared_drives().await?;
    }

    let (log, summary) = walker.finish();
    info!(
        items = summary.items_visited,
        grants = summary.grants_recorded,
        failures = summary.failures,
        "walk finished"
    );
    Ok((log, summary))
}
