extern crate marksweep;

use std::io;
use std::process;

use marksweep::driver::demo;
use marksweep::driver::options::MsvmOptions;
use marksweep::driver::statistics::Statistics;
use structopt::StructOpt;

pub fn main() {
    env_logger::init();

    let opt = MsvmOptions::from_args();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match demo::run(&opt, &mut out) {
        Ok(stats) => exit(&opt, 0, Some(&stats)),
        Err(e) => {
            eprintln!("{e}");
            exit(&opt, e.exit_code(), None)
        }
    }
}

/// Optionally dump stats to stderr then exit
pub fn exit(opts: &MsvmOptions, code: i32, stats: Option<&Statistics>) -> ! {
    if let (true, Some(stats)) = (opts.statistics(), stats) {
        eprintln!();
        eprintln!("~~~~~~~~~~");
        eprintln!("STATISTICS");
        eprintln!("~~~~~~~~~~");
        eprintln!();
        eprintln!("{stats}");
    }
    process::exit(code)
}
