/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Cancels the order on behalf of `user_id`.
    ///
    /// # Errors
    /// Fails if the order was already delivered or its status is unrecognised.
    Cancel { user_id: String },
}

/// Results from OrderActions
#[derive(Debug, Clone, PartialEq)]
pub enum OrderActionResult {
    /// `false` when the order was already cancelled
    Cancel(bool),
    /// The acting user does not own the order; nothing changed
    NotOwned,
}
