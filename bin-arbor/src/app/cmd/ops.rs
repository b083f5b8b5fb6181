use itertools::Itertools;
use arbor_linalg::LinalgOp;

pub fn dispatch(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let lines: Vec<_> = LinalgOp::NAMES.iter()
        .filter(|name| args.filter.as_ref().map_or(true, |f| name.contains(f.as_str())))
        .map(|name| describe(name))
        .try_collect()?;
    Ok(lines.join("\n"))
}

#[derive(Clone, Default, Debug, clap::Args)]
pub struct Args {
    /// Only list operations whose name contains this.
    pub filter: Option<String>,

    #[arg(long, default_value = "0")]
    pub log: u8,
}

fn describe(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    let op = LinalgOp::default_of(name)?;
    let mut line = format!("{op} : {} input(s)", op.arity());
    if !op.output_names().is_empty() {
        line += &format!(" -> ({})", op.output_names().iter().join(", "));
    }
    Ok(line)
}
