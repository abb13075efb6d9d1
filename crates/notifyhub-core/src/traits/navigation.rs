//! Navigation collaborator trait.

/// Performs navigation on behalf of a notification action.
pub trait Navigator: Send + Sync {
    /// In-app navigation to `path`, selecting the given `tab` if any.
    fn navigate(&self, path: &str, tab: Option<&str>);

    /// Plain internal redirect to `path`.
    fn redirect(&self, path: &str);

    /// Open an external URL in a new browsing context.
    fn open_external(&self, url: &str);
}
