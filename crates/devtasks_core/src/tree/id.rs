//! Task id generation.

use crate::model::task::TaskId;
use uuid::Uuid;

/// Returns a fresh task id.
///
/// Ids are random v4 UUIDs in hyphenated form, so they are never reused after
/// deletion and stay unique across restarts with overwhelming probability.
pub fn new_id() -> TaskId {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::new_id;
    use std::collections::HashSet;

    #[test]
    fn new_id_does_not_repeat() {
        let ids = (0..1_000).map(|_| new_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 1_000);
    }
}
