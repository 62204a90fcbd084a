//! Extraction of `@name` mentions from raw message text.
//!
//! Offsets and lengths are counted in characters, not bytes, so they line up
//! with how the messaging service renders rich text.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::User;

/// A resolved mention inside a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionSpan {
    /// Identifier of the mentioned user
    pub recipient_id: String,
    /// Character index of the `@` that starts the mention
    pub offset: usize,
    /// Character length of the mention token, `@` included
    pub length: usize,
}

/// Resolves every `@name` token in `text` to a [`MentionSpan`].
///
/// Tokens are separated by single spaces. A token is a mention only when it
/// starts with `@`; an `@` anywhere else in a token is plain text. Each name is
/// passed to `search` and the first candidate wins. Tokens with no candidate
/// produce no span and do not shift the offsets of later mentions.
///
/// A bare `@` token has no name to look up, so `search` is not called for it.
///
/// Returns the spans in text order, or an empty vector when nothing resolved.
///
/// # Errors
///
/// Propagates the first error returned by `search`.
pub fn resolve<F>(text: &str, mut search: F) -> Result<Vec<MentionSpan>>
where
    F: FnMut(&str) -> Result<Vec<User>>,
{
    let mut mentions = Vec::new();
    let mut offset = 0;

    for token in text.split(' ') {
        let length = token.chars().count();

        if let Some(name) = token.strip_prefix('@')
            && !name.is_empty()
        {
            match search(name)?.into_iter().next() {
                Some(user) => {
                    debug!("Resolved mention @{name} to {} at {offset}", user.uid);
                    mentions.push(MentionSpan {
                        recipient_id: user.uid,
                        offset,
                        length,
                    });
                }
                None => debug!("No user found for mention @{name}"),
            }
        }

        // +1 for the separating space
        offset += length + 1;
    }

    Ok(mentions)
}
