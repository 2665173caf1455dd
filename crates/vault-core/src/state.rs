//! Destination state classification
//!
//! The single place the conflict-vs-safe-update policy lives. Both the
//! remote poller and the conflict resolver call [`classify`] instead of
//! comparing hashes ad hoc. Pure function, no I/O.

/// What the engine should do with one destination, given the current on-disk
/// hash, the hash of the engine's last render write, and the hash of the
/// freshly rendered remote content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Disk already matches the fresh render; nothing to do.
    InSync,
    /// No local edits since the engine's last write, and the remote render
    /// changed: safe to overwrite the destination.
    NeedsRenderWrite,
    /// Local edits happened and the fresh render happens to equal the disk
    /// content: local content must be propagated upstream.
    LocalAhead,
    /// Local edits happened and the remote render differs from disk:
    /// neither side may be silently applied.
    Conflict,
}

/// Classify a destination.
///
/// `last_render` is `None` for a destination the engine has never written
/// (a freshly tracked local file); absent a previous render there is
/// nothing local to protect, so a differing fresh render is a safe
/// overwrite.
///
/// The destination's `last_local_hash` is deliberately not an input: it is
/// watcher bookkeeping and plays no part in this decision.
pub fn classify(current_local: &str, last_render: Option<&str>, fresh_render: &str) -> SyncDecision {
    let locally_edited = match last_render {
        Some(render) => current_local != render,
        None => false,
    };

    match (locally_edited, fresh_render == current_local) {
        (false, true) => SyncDecision::InSync,
        (false, false) => SyncDecision::NeedsRenderWrite,
        (true, true) => SyncDecision::LocalAhead,
        (true, false) => SyncDecision::Conflict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const A: &str = "sha256:aaaa";
    const B: &str = "sha256:bbbb";
    const C: &str = "sha256:cccc";

    #[rstest]
    // No local edits
    #[case(A, Some(A), A, SyncDecision::InSync)]
    #[case(A, Some(A), B, SyncDecision::NeedsRenderWrite)]
    // Local edits
    #[case(B, Some(A), B, SyncDecision::LocalAhead)]
    #[case(B, Some(A), C, SyncDecision::Conflict)]
    #[case(B, Some(A), A, SyncDecision::Conflict)]
    // Never rendered before
    #[case(A, None, A, SyncDecision::InSync)]
    #[case(A, None, B, SyncDecision::NeedsRenderWrite)]
    fn truth_table(
        #[case] current: &str,
        #[case] last_render: Option<&str>,
        #[case] fresh: &str,
        #[case] expected: SyncDecision,
    ) {
        assert_eq!(classify(current, last_render, fresh), expected);
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify(B, Some(A), C), SyncDecision::Conflict);
        }
    }
}
