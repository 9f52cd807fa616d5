//! Unique code generation.
//!
//! Codes are base-36 renderings of a monotonically increasing counter. The
//! first code handed out is `"1"`, so `"0"` is never generated and stays free
//! for fixed holders such as the fallthrough flag.

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeGenerator {
    current: u64,
}

impl CodeGenerator {
    pub const fn new() -> Self {
        Self { current: 0 }
    }

    pub fn next_code(&mut self) -> String {
        self.current += 1;
        to_base36(self.current)
    }

    /// How many codes were handed out so far.
    pub fn issued(&self) -> u64 {
        self.current
    }
}

fn to_base36(mut value: u64) -> String {
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    if digits.is_empty() {
        digits.push(b'0');
    }
    digits.iter().rev().map(|digit| *digit as char).collect()
}

/// The two code spaces of a compilation: storage slots and labels.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerators {
    /// Symbols, temporaries and emitter scratch registers.
    pub variables: CodeGenerator,
    /// Function codes and generated labels.
    pub labels: CodeGenerator,
}
