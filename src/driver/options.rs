//! Command line argument handling
use structopt::StructOpt;

use crate::eval::machine::VmSettings;

/// Run the mark and sweep demonstration machine
#[derive(StructOpt, Debug, Clone, Default)]
#[structopt(name = "msvm")]
pub struct MsvmOptions {
    /// Don't print stack and heap dumps while running
    #[structopt(long = "no-dumps")]
    pub no_dumps: bool,

    /// Print metrics to stderr before exiting
    #[structopt(short = "S", long = "statistics")]
    pub statistics: bool,

    #[structopt(flatten)]
    pub vm: VmSettings,
}

impl MsvmOptions {
    pub fn with_settings(mut self, vm: VmSettings) -> Self {
        self.vm = vm;
        self
    }

    pub fn without_dumps(mut self) -> Self {
        self.no_dumps = true;
        self
    }

    pub fn dumps(&self) -> bool {
        !self.no_dumps
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    pub fn vm_settings(&self) -> &VmSettings {
        &self.vm
    }
}
