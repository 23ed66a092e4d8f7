//! The scripted demonstration run by `msvm`
//!
//! Builds a couple of composites, leaves some objects unrooted and
//! collects, dumping the stack and heap along the way.

use std::io::Write;

use crate::eval::{machine::vm::Vm, memory::object::Kind};

use super::{error::DriverError, options::MsvmOptions, statistics::Statistics};

fn dump(opt: &MsvmOptions, vm: &Vm, out: &mut dyn Write) -> Result<(), DriverError> {
    if opt.dumps() {
        writeln!(out)?;
        write!(out, "{}", vm.dump_stack())?;
        writeln!(out)?;
        write!(out, "{}", vm.dump_heap())?;
    }
    Ok(())
}

/// Run the demonstration script writing dumps to `out`
pub fn run(opt: &MsvmOptions, out: &mut dyn Write) -> Result<Statistics, DriverError> {
    let mut vm = Vm::new(opt.vm_settings());

    vm.push_scalar(42)?;

    let unrooted = vm.allocate(Kind::Scalar);
    vm.set_value(unrooted, 5)?;

    vm.push_scalar(1)?;
    vm.push_scalar(2)?;
    dump(opt, &vm, out)?;

    vm.push_composite()?;
    dump(opt, &vm, out)?;

    vm.push_composite()?;
    let unrooted = vm.allocate(Kind::Scalar);
    vm.set_value(unrooted, 123)?;
    dump(opt, &vm, out)?;

    let report = vm.gc();
    if opt.dumps() {
        writeln!(out)?;
        writeln!(
            out,
            "Collected {} of {} objects; next collection at {}",
            report.freed, report.live_before, report.threshold
        )?;
    }
    dump(opt, &vm, out)?;

    vm.stop_clock();
    Ok(Statistics::from_vm(&vm))
}
