//! Instance-name guard. The `t3-` prefix convention is a deployment safety
//! policy, not a provider constraint: resources whose name does not carry the
//! prefix are invisible to the gateway and can never be mutated through it.

#[derive(Debug, Clone)]
pub struct NameGuard {
    prefix: Option<String>,
}

impl Default for NameGuard {
    fn default() -> Self {
        Self::new("t3-")
    }
}

impl NameGuard {
    /// An empty prefix disables the guard.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    pub fn disabled() -> Self {
        Self { prefix: None }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.prefix.as_deref().map_or(true, |p| name.starts_with(p))
    }

    /// A missing name tag never passes an enabled guard.
    pub fn matches_tag(&self, name: Option<&str>) -> bool {
        match (self.prefix.as_deref(), name) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(prefix), Some(name)) => name.starts_with(prefix),
        }
    }

    /// Prepends the prefix unless the name already carries it.
    pub fn qualify(&self, name: &str) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !name.starts_with(prefix) => format!("{prefix}{name}"),
            _ => name.to_string(),
        }
    }
}
