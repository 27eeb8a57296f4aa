//! Composable operation fragments.
//!
//! A [`Fragment`] is a unit of quantum operations over a fixed number of
//! registers — a preparation, a basis change, or a terminal measurement.
//! Fragments are opaque to the dispatch layer except for their register count
//! and composability: composing two fragments concatenates their operations
//! and sizes the result to the larger register span.

use serde::Serialize;

/// A single operation on one or two registers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Gate {
    /// Pauli-X (bit flip).
    X(usize),
    /// Hadamard.
    H(usize),
    /// Phase gate S = diag(1, i).
    S(usize),
    /// Inverse phase gate.
    Sdg(usize),
    /// T gate = diag(1, e^{iπ/4}).
    T(usize),
    /// Inverse T gate.
    Tdg(usize),
    /// Rotation about Y by the given angle (radians).
    Ry(usize, f64),
    /// Controlled-X with (control, target).
    Cx(usize, usize),
}

/// Composable unit of quantum operations over a fixed register count.
///
/// Built with chainable methods; register indices out of range fail fast.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fragment {
    registers: usize,
    ops: Vec<Gate>,
    measure_all: bool,
}

impl Fragment {
    /// Empty fragment over `registers` registers. Zero registers is permitted
    /// and acts as a no-op under composition.
    pub fn new(registers: usize) -> Self {
        Self {
            registers,
            ops: Vec::new(),
            measure_all: false,
        }
    }

    /// Number of registers this fragment spans.
    pub fn registers(&self) -> usize {
        self.registers
    }

    /// Operations in application order.
    pub fn ops(&self) -> &[Gate] {
        &self.ops
    }

    /// Whether this fragment actually measures anything. A measure directive
    /// on a zero-register fragment measures nothing and does not count.
    pub fn has_measurement(&self) -> bool {
        self.measure_all && self.registers > 0
    }

    fn check(&self, register: usize) {
        assert!(
            register < self.registers,
            "register {register} out of range for {}-register fragment",
            self.registers
        );
    }

    /// Append a Pauli-X on `register`.
    pub fn x(mut self, register: usize) -> Self {
        self.check(register);
        self.ops.push(Gate::X(register));
        self
    }

    /// Append a Hadamard on `register`.
    pub fn h(mut self, register: usize) -> Self {
        self.check(register);
        self.ops.push(Gate::H(register));
        self
    }

    /// Append an S gate on `register`.
    pub fn s(mut self, register: usize) -> Self {
        self.check(register);
        self.ops.push(Gate::S(register));
        self
    }

    /// Append an S† gate on `register`.
    pub fn sdg(mut self, register: usize) -> Self {
        self.check(register);
        self.ops.push(Gate::Sdg(register));
        self
    }

    /// Append a T gate on `register`.
    pub fn t(mut self, register: usize) -> Self {
        self.check(register);
        self.ops.push(Gate::T(register));
        self
    }

    /// Append a T† gate on `register`.
    pub fn tdg(mut self, register: usize) -> Self {
        self.check(register);
        self.ops.push(Gate::Tdg(register));
        self
    }

    /// Append a Y rotation by `theta` radians on `register`.
    pub fn ry(mut self, register: usize, theta: f64) -> Self {
        self.check(register);
        self.ops.push(Gate::Ry(register, theta));
        self
    }

    /// Append a controlled-X.
    pub fn cx(mut self, control: usize, target: usize) -> Self {
        self.check(control);
        self.check(target);
        assert!(control != target, "cx control and target must differ");
        self.ops.push(Gate::Cx(control, target));
        self
    }

    /// Mark every register for terminal measurement.
    pub fn measure_all(mut self) -> Self {
        self.measure_all = true;
        self
    }

    /// Compose with `other`: operations of `self` first, then `other`, sized
    /// to the larger register span. Composition is associative; the measure
    /// directive is OR-combined.
    pub fn compose(&self, other: &Fragment) -> Fragment {
        let mut ops = self.ops.clone();
        ops.extend_from_slice(&other.ops);
        Fragment {
            registers: self.registers.max(other.registers),
            ops,
            measure_all: self.measure_all || other.measure_all,
        }
    }
}
