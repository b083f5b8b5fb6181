use log::info;
use clap::{Parser, Subcommand};

use super::cmd::{apply, ops};
use super::utils::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Cmd
}

#[derive(Subcommand, Debug)]
#[clap(rename_all="lower")]
pub enum Cmd {
    Apply(apply::Args),
    Ops(ops::Args),
}

impl CliArgs {
    fn log_level(&self) -> log::LevelFilter {
        let level = match &self.command {
            Cmd::Apply(args) => args.log,
            Cmd::Ops(args)   => args.log,
        };
        arbor::util::log::level_from_verbosity(level)
    }
}

pub struct App {
    pub args: CliArgs
}

impl App {
    pub fn new() -> Self {
        let args = CliArgs::parse();
        App { args }
    }

    pub fn run(&self) -> Result<String, Box<dyn std::error::Error>> {
        self.init_logger();

        info!("args: {:?}", self.args);

        let (res, time) = measure(||
            self.dispatch()
        );

        info!("time: {:?}", time);

        res
    }

    fn init_logger(&self) {
        let l = self.args.log_level();
        if let Err(e) = arbor::util::log::init_simple_logger(l) {
            eprintln!("failed to initialize logger: {e}");
        }
    }

    fn dispatch(&self) -> Result<String, Box<dyn std::error::Error>> {
        guard_panic(||
            match &self.args.command {
                Cmd::Apply(args) => apply::dispatch(args),
                Cmd::Ops(args)   => ops::dispatch(args),
            }
        )
    }
}
