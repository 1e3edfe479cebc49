use crate::error::BatchError;
use crate::request::RenameRequest;
use std::collections::HashMap;
use std::path::Path;

/// Requests that survived validation, split into real renames and no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedBatch {
    /// Indices of requests that need at least one filesystem call
    pub active: Vec<usize>,
    /// Indices of requests whose target equals their current name
    pub noops: Vec<usize>,
}

impl ValidatedBatch {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Check a batch before anything touches the filesystem.
///
/// The batch is rejected as a whole on the first structural problem found.
/// Checks run in a fixed order (names, then targets, then sources) so the
/// reported error is deterministic.
pub fn validate_batch(requests: &[RenameRequest]) -> Result<ValidatedBatch, BatchError> {
    for (index, request) in requests.iter().enumerate() {
        if let Some(reason) = invalid_name_reason(&request.target_name) {
            return Err(BatchError::InvalidName {
                request: index,
                name: request.target_name.clone(),
                reason,
            });
        }
    }

    // No-ops still claim their own name, so a second request targeting it is
    // ambiguous too.
    if let Some((key, indices)) = first_duplicate(requests, |r| &r.target_name) {
        return Err(BatchError::DuplicateTarget {
            directory: key.0.to_path_buf(),
            name: key.1.to_string(),
            requests: indices,
        });
    }

    if let Some((key, indices)) = first_duplicate(requests, |r| &r.current_name) {
        return Err(BatchError::DuplicateSource {
            directory: key.0.to_path_buf(),
            name: key.1.to_string(),
            requests: indices,
        });
    }

    let (noops, active): (Vec<usize>, Vec<usize>) =
        (0..requests.len()).partition(|&i| requests[i].is_noop());

    Ok(ValidatedBatch { active, noops })
}

/// Returns why `name` cannot be used as a leaf name, if it cannot
pub fn invalid_name_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("name is empty");
    }
    if name == "." || name == ".." {
        return Some("name is a directory reference");
    }
    if name.chars().any(std::path::is_separator) {
        return Some("name contains a path separator");
    }
    if name.contains('\0') {
        return Some("name contains a NUL byte");
    }
    None
}

/// Group requests by `(directory, key(request))` and return the group with
/// more than one member whose first index is lowest.
fn first_duplicate<'a, F>(
    requests: &'a [RenameRequest],
    key: F,
) -> Option<((&'a Path, &'a str), Vec<usize>)>
where
    F: Fn(&'a RenameRequest) -> &'a String,
{
    let mut groups: HashMap<(&Path, &str), Vec<usize>> = HashMap::new();
    for (index, request) in requests.iter().enumerate() {
        groups
            .entry((request.directory.as_path(), key(request).as_str()))
            .or_default()
            .push(index);
    }

    groups
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .min_by_key(|(_, indices)| indices[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(path: &str, target: &str) -> RenameRequest {
        RenameRequest::for_path(path, target).unwrap()
    }

    #[test]
    fn test_valid_batch_splits_noops() {
        let requests = vec![
            req("/d/a", "b"),
            req("/d/c", "c"),
            req("/d/b", "a"),
        ];
        let validated = validate_batch(&requests).unwrap();
        assert_eq!(validated.active, vec![0, 2]);
        assert_eq!(validated.noops, vec![1]);
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", ".", "..", "a/b", "nul\0byte"] {
            let requests = vec![req("/d/a", bad)];
            let err = validate_batch(&requests).unwrap_err();
            assert!(
                matches!(err, BatchError::InvalidName { request: 0, .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_backslash_is_separator_on_windows() {
        assert!(invalid_name_reason(r"a\b").is_some());
    }

    #[test]
    fn test_duplicate_target() {
        let requests = vec![
            req("/d/a", "x"),
            req("/d/b", "y"),
            req("/d/c", "x"),
        ];
        let err = validate_batch(&requests).unwrap_err();
        assert_eq!(
            err,
            BatchError::DuplicateTarget {
                directory: "/d".into(),
                name: "x".to_string(),
                requests: vec![0, 2],
            }
        );
    }

    #[test]
    fn test_noop_claims_its_own_name() {
        let requests = vec![req("/d/a", "a"), req("/d/b", "a")];
        let err = validate_batch(&requests).unwrap_err();
        assert!(matches!(err, BatchError::DuplicateTarget { .. }));
    }

    #[test]
    fn test_same_target_in_different_directories_is_fine() {
        let requests = vec![
            req("/folder1/file_1", "file_2"),
            req("/folder2/file_1", "file_2"),
        ];
        let validated = validate_batch(&requests).unwrap();
        assert_eq!(validated.active, vec![0, 1]);
    }

    #[test]
    fn test_duplicate_source() {
        let requests = vec![req("/d/a", "x"), req("/d/a", "y")];
        let err = validate_batch(&requests).unwrap_err();
        assert!(matches!(err, BatchError::DuplicateSource { ref requests, .. } if requests == &vec![0, 1]));
    }

    #[test]
    fn test_names_checked_before_duplicates() {
        let requests = vec![req("/d/a", "x"), req("/d/b", "x"), req("/d/c", "")];
        let err = validate_batch(&requests).unwrap_err();
        assert!(matches!(err, BatchError::InvalidName { request: 2, .. }));
    }
}
