//! Debugger attachment: the platform handle owned by the core, the
//! identity-compared debugger object, and loaded symbol tables.

use std::collections::BTreeMap;
use std::rc::Rc;

/// An attached debugger session. Attachment is by object identity; the
/// same `Rc` must be passed to detach-by-identity checks.
#[derive(Debug, Default)]
pub struct Debugger {
    pub name: String,
}

impl Debugger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The core-owned side of the debugger interface: breakpoints and
/// watchpoints the execution loops consult.
#[derive(Debug, Default)]
pub struct DebuggerPlatform {
    breakpoints: Vec<u32>,
    watchpoints: Vec<(u32, u32)>,
    attached: Option<Rc<Debugger>>,
}

impl DebuggerPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, debugger: Rc<Debugger>) {
        self.attached = Some(debugger);
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    pub fn attached(&self) -> Option<&Rc<Debugger>> {
        self.attached.as_ref()
    }

    pub fn is_attached_to(&self, debugger: &Rc<Debugger>) -> bool {
        self.attached
            .as_ref()
            .is_some_and(|d| Rc::ptr_eq(d, debugger))
    }

    pub fn set_breakpoint(&mut self, address: u32) {
        if !self.breakpoints.contains(&address) {
            self.breakpoints.push(address);
        }
    }

    pub fn clear_breakpoint(&mut self, address: u32) {
        self.breakpoints.retain(|&a| a != address);
    }

    pub fn has_breakpoint(&self, address: u32) -> bool {
        self.breakpoints.contains(&address)
    }

    pub fn set_watchpoint(&mut self, start: u32, end: u32) {
        self.watchpoints.push((start, end));
    }

    pub fn clear_watchpoints(&mut self) {
        self.watchpoints.clear();
    }

    pub fn watches(&self, address: u32) -> bool {
        self.watchpoints
            .iter()
            .any(|&(start, end)| (start..end).contains(&address))
    }
}

/// Name-to-value symbol mappings loaded from debug info.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, i32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i32) {
        self.symbols.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<i32> {
        self.symbols.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_is_by_identity() {
        let mut platform = DebuggerPlatform::new();
        let a = Rc::new(Debugger::new("a"));
        let b = Rc::new(Debugger::new("a"));
        platform.attach(Rc::clone(&a));
        assert!(platform.is_attached_to(&a));
        assert!(!platform.is_attached_to(&b));
        platform.detach();
        assert!(platform.attached().is_none());
    }
}
