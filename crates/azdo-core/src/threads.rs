//! Rebuilds reply trees from pull request comment threads.
//!
//! Azure DevOps returns each thread as a flat list of comments where replies
//! point at their parent through `parentCommentId`. This module turns every
//! usable thread into one [`ReconstructedComment`] whose `replies` hold the
//! nested conversation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::thread_status_to_string;
use crate::types::{Comment, CommentThread, ThreadContext};

/// Where in the file a thread is anchored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<i64>,
}

impl CommentLocation {
    fn from_context(context: &ThreadContext) -> Self {
        let start = context.right_file_start.unwrap_or_default();
        let end = context.right_file_end.unwrap_or_default();
        Self {
            start_line: start.line,
            end_line: end.line,
            start_offset: start.offset,
            end_offset: end.offset,
        }
    }
}

/// A comment together with its replies.
///
/// File path, location, status and thread id are thread-level values and are
/// identical for every comment of one thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructedComment {
    pub file_path: String,
    pub location: CommentLocation,
    pub content: String,
    pub status: String,
    pub thread_id: i64,
    pub author: String,
    pub comment_id: i64,
    pub parent_comment_id: i64,
    #[serde(default)]
    pub replies: Vec<ReconstructedComment>,
}

/// A thread that carries everything needed to build its tree.
struct UsableThread<'a> {
    id: i64,
    status: i64,
    file_path: &'a str,
    context: &'a ThreadContext,
    comments: &'a [Comment],
}

impl<'a> UsableThread<'a> {
    fn check(thread: &'a CommentThread) -> Option<Self> {
        // An explicit null marks a thread detached from the pull request.
        if matches!(thread.pull_request_thread_context, Some(None)) {
            return None;
        }

        let first = thread.comments.first()?;
        first.content.as_deref().filter(|c| !c.is_empty())?;
        first.author_name().filter(|a| !a.is_empty())?;

        let context = thread.thread_context.as_ref()?;
        let file_path = context.file_path.as_deref().filter(|p| !p.is_empty())?;

        Some(Self {
            id: thread.id?,
            status: thread.status?,
            file_path,
            context,
            comments: &thread.comments,
        })
    }

    /// Builds the tree and returns the thread's first top-level comment.
    fn reconstruct(&self) -> Option<ReconstructedComment> {
        let location = CommentLocation::from_context(self.context);
        let status = thread_status_to_string(self.status);

        let mut arena: Vec<Option<ReconstructedComment>> = self
            .comments
            .iter()
            .map(|comment| {
                Some(ReconstructedComment {
                    file_path: self.file_path.to_string(),
                    location: location.clone(),
                    content: comment.content.clone().unwrap_or_default(),
                    status: status.to_string(),
                    thread_id: self.id,
                    author: comment.author_name().unwrap_or_default().to_string(),
                    comment_id: comment.id.unwrap_or(0),
                    parent_comment_id: comment.parent_comment_id.unwrap_or(0),
                    replies: Vec::new(),
                })
            })
            .collect();

        // Later duplicates of an id win.
        let index_by_id: HashMap<i64, usize> = self
            .comments
            .iter()
            .enumerate()
            .map(|(index, comment)| (comment.id.unwrap_or(0), index))
            .collect();

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.comments.len()];
        for (index, comment) in self.comments.iter().enumerate() {
            match comment.parent_comment_id.unwrap_or(0) {
                0 => roots.push(index),
                parent => {
                    if let Some(&parent_index) = index_by_id.get(&parent) {
                        children[parent_index].push(index);
                    }
                }
            }
        }

        if roots.len() > 1 {
            debug!(
                thread_id = self.id,
                discarded = roots.len() - 1,
                "Thread has several top-level comments, keeping the first"
            );
        }

        let root = *roots.first()?;
        assemble(root, &mut arena, &children)
    }
}

/// Moves every node reachable from `root` under its parent.
///
/// Nodes are visited in reverse pre-order so each child is complete before
/// its parent takes it.
fn assemble(
    root: usize,
    arena: &mut [Option<ReconstructedComment>],
    children: &[Vec<usize>],
) -> Option<ReconstructedComment> {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(children[index].iter().copied());
    }

    for &index in order.iter().rev() {
        let replies: Vec<ReconstructedComment> = children[index]
            .iter()
            .filter_map(|&child| arena[child].take())
            .collect();
        if let Some(node) = arena[index].as_mut() {
            node.replies = replies;
        }
    }

    arena[root].take()
}

/// Convert provider threads into one reply tree per usable thread.
///
/// Threads without a file path, author, content, numeric status or numeric id
/// are skipped, as are threads without any top-level comment. Output order
/// follows the provider's thread order.
pub fn process_pull_request_comments(threads: &[CommentThread]) -> Vec<ReconstructedComment> {
    let comments: Vec<ReconstructedComment> = threads
        .iter()
        .filter_map(UsableThread::check)
        .filter_map(|thread| thread.reconstruct())
        .collect();

    debug!(
        threads = threads.len(),
        reconstructed = comments.len(),
        "Processed pull request comment threads"
    );

    comments
}
