use crate::models::HealthRes;

/// Simple health service shared by the server binary and the REST router.
///
/// Reports liveness and which storage backend the process was started with.
#[derive(Clone, Debug)]
pub struct HealthService {
    storage: String,
}

impl HealthService {
    /// Creates a new instance of HealthService.
    ///
    /// # Arguments
    /// * `storage` - Human-readable description of the configured case storage
    pub fn new(storage: impl Into<String>) -> Self {
        Self {
            storage: storage.into(),
        }
    }

    /// Liveness without any storage detail, for callers that have no service instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "casebook is alive".into(),
            storage: None,
        }
    }

    pub fn check_health_instance(&self) -> HealthRes {
        HealthRes {
            storage: Some(self.storage.clone()),
            ..Self::check_health()
        }
    }
}
