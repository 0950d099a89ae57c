// -----------------------------------------------------------------------------
// ----- GatewayIdentity -------------------------------------------------------

/// Identity negotiated during the handshake. Immutable once learned; the
/// application uses it for device registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayIdentity {
    pub unique_id: String,
    pub manufacturer: &'static str,
    pub model: String,
    pub firmware: String,
}

impl GatewayIdentity {
    pub fn new(unique_id: String, model: String, firmware: String) -> Self {
        Self {
            unique_id,
            manufacturer: "BTicino",
            model,
            firmware,
        }
    }

    /// Display name shown to the user.
    pub fn name(&self) -> String {
        format!("{} Gateway", self.model)
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
