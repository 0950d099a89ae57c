// -----------------------------------------------------------------------------
// ----- TestOutcome -----------------------------------------------------------

/// Structured result of `SessionSupervisor::test`.
///
/// `Unreachable` means "fix your address" (retryable with backoff);
/// `PasswordRequired` / `PasswordError` mean "fix your credentials" and are
/// surfaced so the application can start a re-authentication flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestOutcome {
    pub success: bool,
    pub reason: TestReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestReason {
    Ok,
    PasswordRequired,
    PasswordError,
    Unreachable,
    ProtocolError,
}

impl TestOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            reason: TestReason::Ok,
        }
    }

    pub fn failed(reason: TestReason) -> Self {
        Self {
            success: false,
            reason,
        }
    }
}

impl TestReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TestReason::Ok => "ok",
            TestReason::PasswordRequired => "password_required",
            TestReason::PasswordError => "password_error",
            TestReason::Unreachable => "unreachable",
            TestReason::ProtocolError => "protocol_error",
        }
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
