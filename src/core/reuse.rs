//! # Reuse arbiter: dispatch to the live child, or rotate.
//!
//! A live dispatcher can absorb a new invocation only when it is the same
//! program in the same environment. The decision is kept free of I/O so the
//! table below can be tested on its own.

/// Outcome of comparing a new invocation against the live dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReuseDecision {
    /// Same executable and environment; feed the request to the live child.
    Reuse,
    /// Different executable or environment; retire the child, launch fresh.
    Rotate,
}

/// Compares the executable identity and the complete environment.
///
/// The environment must match element for element, in order; an absent
/// environment only matches an absent one.
pub(crate) fn reuse_decision(
    argv0: &str,
    envp: Option<&[String]>,
    last_argv0: Option<&str>,
    last_envp: Option<&[String]>,
) -> ReuseDecision {
    if last_argv0 != Some(argv0) {
        return ReuseDecision::Rotate;
    }
    match (envp, last_envp) {
        (None, None) => ReuseDecision::Reuse,
        (Some(new), Some(last)) if new == last => ReuseDecision::Reuse,
        _ => ReuseDecision::Rotate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envp(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_descriptor_is_reused() {
        assert_eq!(
            reuse_decision("backend.sh", None, Some("backend.sh"), None),
            ReuseDecision::Reuse
        );
        let env = envp(&["http_proxy=proxy:3128", "LANG=C"]);
        assert_eq!(
            reuse_decision("backend.sh", Some(&env), Some("backend.sh"), Some(&env)),
            ReuseDecision::Reuse
        );
    }

    #[test]
    fn a_different_executable_rotates() {
        assert_eq!(
            reuse_decision("other.sh", None, Some("backend.sh"), None),
            ReuseDecision::Rotate
        );
    }

    #[test]
    fn a_different_environment_rotates() {
        let old = envp(&["http_proxy=proxy:3128"]);
        let new = envp(&["http_proxy=proxy:8080"]);
        assert_eq!(
            reuse_decision("backend.sh", Some(&new), Some("backend.sh"), Some(&old)),
            ReuseDecision::Rotate
        );
    }

    #[test]
    fn environment_order_matters() {
        let old = envp(&["A=1", "B=2"]);
        let new = envp(&["B=2", "A=1"]);
        assert_eq!(
            reuse_decision("backend.sh", Some(&new), Some("backend.sh"), Some(&old)),
            ReuseDecision::Rotate
        );
    }

    #[test]
    fn absence_only_matches_absence() {
        let env = envp(&["LANG=C"]);
        assert_eq!(
            reuse_decision("backend.sh", Some(&env), Some("backend.sh"), None),
            ReuseDecision::Rotate
        );
        assert_eq!(
            reuse_decision("backend.sh", None, Some("backend.sh"), Some(&env)),
            ReuseDecision::Rotate
        );
    }

    #[test]
    fn no_previous_child_rotates() {
        assert_eq!(
            reuse_decision("backend.sh", None, None, None),
            ReuseDecision::Rotate
        );
    }
}
