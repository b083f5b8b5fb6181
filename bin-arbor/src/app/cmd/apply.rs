use itertools::Itertools;
use log::{debug, info};
use arbor::Value;
use arbor_linalg::{ops, Array, LinalgOp, MapOpts};
use crate::app::utils::*;
use crate::app::err::*;

pub fn dispatch(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    App::new(args.clone()).run()
}

#[derive(Clone, Default, Debug, clap::Args)]
pub struct Args {
    /// Operation name, see `arb ops`.
    pub op: String,

    /// JSON files or inline JSON; the first is the primary argument.
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Keyword argument of the operation, as `key=value`.
    #[arg(short = 'w', long = "kw")]
    pub kwargs: Vec<String>,

    /// Restrict the operation to these key chains.
    #[arg(short = 'k', long = "key-chain")]
    pub key_chains: Vec<String>,

    /// Apply at `from` and move the result to `to`, as `from=to`.
    #[arg(short, long)]
    pub rename: Vec<String>,

    /// Exclude the given key chains instead of restricting to them.
    #[arg(short, long)]
    pub skip: bool,

    #[arg(short, long)]
    pub prune: bool,

    #[arg(long)]
    pub map_seq: bool,

    /// Fail when a secondary input lacks a key chain of the primary.
    #[arg(long)]
    pub strict: bool,

    /// JSON file holding an existing container to write the result into.
    #[arg(short, long)]
    pub out: Option<String>,

    #[arg(long, default_value = "0")]
    pub log: u8,
}

pub struct App {
    args: Args
}

impl App {
    pub fn new(args: Args) -> Self {
        App { args }
    }

    pub fn run(&self) -> Result<String, Box<dyn std::error::Error>> {
        let op = self.op()?;
        info!("op: {op}");

        let inputs: Vec<Value<Array>> = self.args.inputs.iter().map(|s| load_value(s)).try_collect()?;
        ensure!(
            inputs.len() == op.arity(),
            "`{}` takes {} input(s), {} given.", op.name(), op.arity(), inputs.len()
        );

        let opts = self.opts()?;
        debug!("opts: {:?}", opts);

        let args = inputs.iter().map(|v| v.view()).collect_vec();

        if let Some(path) = &self.args.out {
            ensure!(op.outputs() == 1, "`{}` has {} outputs and cannot write into `--out`.", op.name(), op.outputs());

            let mut out = load_container(path)?;
            ops::apply_into(&op, &args, &opts, &mut out)?;
            save_container(path, &out)?;

            info!("written into {path}");
            Ok(serde_json::to_string_pretty(&out)?)
        } else if op.outputs() == 1 {
            let res = ops::apply(&op, &args, &opts)?;
            Ok(serde_json::to_string_pretty(&res)?)
        } else {
            let parts = ops::apply_multi(&op, &args, &opts)?;
            let mut obj = serde_json::Map::new();
            for (name, part) in op.output_names().iter().zip(parts) {
                obj.insert(name.to_string(), serde_json::to_value(&part)?);
            }
            Ok(serde_json::to_string_pretty(&obj)?)
        }
    }

    fn op(&self) -> Result<LinalgOp, Box<dyn std::error::Error>> {
        let kwargs: Vec<_> = self.args.kwargs.iter().map(|s| parse_assign(s)).try_collect()?;
        Ok(LinalgOp::from_name(&self.args.op, kwargs)?)
    }

    fn opts(&self) -> Result<MapOpts, Box<dyn std::error::Error>> {
        let args = &self.args;
        ensure!(
            args.rename.is_empty() || args.key_chains.is_empty(),
            "`--rename` and `--key-chain` cannot be given together."
        );

        let opts = if !args.rename.is_empty() {
            let pairs: Vec<_> = args.rename.iter().map(|s| parse_assign(s)).try_collect()?;
            MapOpts::new().rename(pairs)
        } else if !args.key_chains.is_empty() {
            MapOpts::new().key_chains(args.key_chains.iter().map(|s| s.as_str()))
        } else {
            ensure!(!args.skip, "`--skip` requires `--key-chain`.");
            MapOpts::new()
        };

        Ok(opts
            .to_apply(!args.skip)
            .prune_unapplied(args.prune)
            .map_sequences(args.map_seq)
            .assert_identical(args.strict)
        )
    }
}
