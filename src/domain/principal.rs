use uuid::Uuid;

const ADMIN_KIND: &str = "admin";

/// The verified identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub kind: String,
}

impl Principal {
    pub fn admin(id: Uuid) -> Principal {
        Self {
            id,
            kind: String::from(ADMIN_KIND),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == ADMIN_KIND
    }
}
