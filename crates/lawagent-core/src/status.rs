//! Status-callback contract shared by Flow, the Specialist Agent, and the
//! Critic, so a single request's phase boundaries can be reported from
//! `route-start` all the way down to `refined-search-start` without
//! `lawagent-agent` depending back on `lawagent-flow`.

/// `(stage, detail, state)` with `state ∈ {"running", "complete", "error"}`.
/// Best-effort: a panicking or failing callback never aborts the pipeline.
pub type StatusCallback<'a> = dyn Fn(&str, &str, &str) + Send + Sync + 'a;

/// Invoke the callback if present; a missing callback is a silent no-op.
pub fn notify(callback: Option<&StatusCallback<'_>>, stage: &str, detail: &str, state: &str) {
    if let Some(cb) = callback {
        cb(stage, detail, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_is_a_no_op_without_a_callback() {
        notify(None, "route", "detail", "running");
    }

    #[test]
    fn notify_invokes_the_callback_with_its_arguments() {
        let seen = std::cell::RefCell::new(None);
        let callback = |stage: &str, detail: &str, state: &str| {
            *seen.borrow_mut() = Some((stage.to_string(), detail.to_string(), state.to_string()));
        };
        notify(Some(&callback), "critic", "round 1", "running");
        assert_eq!(*seen.borrow(), Some(("critic".to_string(), "round 1".to_string(), "running".to_string())));
    }
}
