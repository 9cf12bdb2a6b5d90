/// Classification for retry policy.
///
/// Used by the marketplace client to decide whether a failed request gets the
/// single credential-refresh retry.
///
/// # Behavior Summary
///
/// | Class | Invalidate token? | Retry request? |
/// |-------|-------------------|----------------|
/// | `Never` | No | No |
/// | `RefreshCredentials` | Yes | Once, with a freshly fetched token |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry inside this crate.
    /// Timeouts, server errors and mapping errors surface to the caller, who
    /// may re-run the whole operation later.
    Never,

    /// The upstream rejected our bearer token.
    /// Drop the cached credential, force a refresh and replay the request once.
    RefreshCredentials,
}
