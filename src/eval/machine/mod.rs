//! The stack machine and its collector roots
use structopt::StructOpt;

use super::memory::heap::INITIAL_GC_THRESHOLD;

pub mod metrics;
pub mod stack;
pub mod vm;

use self::stack::MAX_STACK_SIZE;

/// Settings to control the machine and its collector
#[derive(StructOpt, Debug, Clone, PartialEq, Eq)]
pub struct VmSettings {
    /// Capacity of the operand stack
    #[structopt(long = "stack-size", default_value = "256")]
    pub stack_size: usize,
    /// Live object count that triggers the first collection
    #[structopt(long = "threshold", default_value = "10")]
    pub initial_threshold: usize,
    /// Dump the heap to stderr after mark and after sweep
    #[structopt(long = "dump-gc")]
    pub dump_heap: bool,
}

impl Default for VmSettings {
    fn default() -> Self {
        VmSettings {
            stack_size: MAX_STACK_SIZE,
            initial_threshold: INITIAL_GC_THRESHOLD,
            dump_heap: false,
        }
    }
}

impl VmSettings {
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.initial_threshold = threshold;
        self
    }

    pub fn with_heap_dumps(mut self) -> Self {
        self.dump_heap = true;
        self
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_cli_defaults_match_default() {
        let parsed = VmSettings::from_iter(vec!["msvm"]);
        assert_eq!(parsed, VmSettings::default());
    }

    #[test]
    pub fn test_cli_overrides() {
        let parsed =
            VmSettings::from_iter(vec!["msvm", "--stack-size", "8", "--threshold", "3", "--dump-gc"]);
        assert_eq!(
            parsed,
            VmSettings::default()
                .with_stack_size(8)
                .with_threshold(3)
                .with_heap_dumps()
        );
    }
}
