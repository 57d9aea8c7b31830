//! Running filesystem work with reduced privileges.
//!
//! User hierarchies are scanned with privileges dropped, so that a setuid
//! indexer can't be tricked into reading files the invoking user couldn't.
//! How privileges are dropped is platform policy and lives outside this
//! crate; the scanner only asks for a [`Scope`] around the work.

use std::fmt;

/// Lowers and restores the privileges of the running process.
pub trait Privileges {
    fn lower(&self);
    fn restore(&self);
}

/// For processes that never had any privileges to drop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrivileges;

impl Privileges for NoPrivileges {
    fn lower(&self) {}
    fn restore(&self) {}
}

/// Privileges are lowered for as long as this guard lives.
#[must_use = "privileges are restored as soon as the scope is dropped"]
pub struct Scope<'a> {
    privileges: &'a dyn Privileges,
}

impl<'a> Scope<'a> {
    pub fn enter(privileges: &'a dyn Privileges) -> Self {
        tracing::trace!("Lowering privileges");
        privileges.lower();
        Self { privileges }
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        tracing::trace!("Restoring privileges");
        self.privileges.restore();
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scope")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Records how deep into lowered privileges the process is.
    #[derive(Debug, Default)]
    pub(crate) struct Recording {
        pub(crate) depth: Cell<i32>,
        pub(crate) entered: Cell<usize>,
    }

    impl Privileges for Recording {
        fn lower(&self) {
            self.depth.set(self.depth.get() + 1);
            self.entered.set(self.entered.get() + 1);
        }

        fn restore(&self) {
            self.depth.set(self.depth.get() - 1);
        }
    }

    #[test]
    fn test_scope_restores_on_drop() {
        let privileges = Recording::default();
        {
            let _scope = Scope::enter(&privileges);
            assert_eq!(privileges.depth.get(), 1);
        }
        assert_eq!(privileges.depth.get(), 0);
        assert_eq!(privileges.entered.get(), 1);
    }
}
