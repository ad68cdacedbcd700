pub trait HandlerInfo {
    /// Gets a short name of the session handler.
    fn handler_name() -> &'static str;

    /// Gets an informational string about the session handler.
    fn handler_version() -> &'static str {
        ""
    }
}
