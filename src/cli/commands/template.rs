//! `relia template` command - Print starter input files

use console::style;
use miette::Result;

use crate::cli::GlobalOpts;
use crate::entities::registry::CSV_HEADERS;

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Print a topology file template instead of a component table
    #[arg(long)]
    pub topology: bool,
}

const EXAMPLE_ROWS: &[&str] = &[
    "/Sat/Power/BatteryA,2.0e-6,1.5e-6,3.0e-6,1,,uniform,primary cell",
    "/Sat/Power/BatteryB,2.0e-6,1.5e-6,3.0e-6,1,,uniform,redundant cell",
    "/Sat/Control/OBC,5.0e-6,,,1,1.2,,",
    "/Sat/Control/Gyro/X,1.0e-6,0.8e-6,1.4e-6,1,,triangular,",
    "/Sat/Control/Gyro/Y,1.0e-6,0.8e-6,1.4e-6,1,,triangular,",
    "/Sat/Control/Gyro/Z,1.0e-6,0.8e-6,1.4e-6,1,,triangular,",
];

const TOPOLOGY_TEMPLATE: &str = r#"# Topology for the /Sat slice
root: sat
blocks:
  sat:
    kind: series
    children:
      - block: power
      - component: /Sat/Control/OBC
      - block: gyros
  power:
    kind: parallel
    prefix: /Sat/Power
  gyros:
    kind: k_out_of_n
    k: 2
    prefix: /Sat/Control/Gyro
"#;

pub fn run(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    if args.topology {
        print!("{}", TOPOLOGY_TEMPLATE);
    } else {
        println!("{}", CSV_HEADERS.join(","));
        for row in EXAMPLE_ROWS {
            println!("{}", row);
        }
    }

    if !global.quiet {
        eprintln!(
            "{} Redirect to a file, e.g. {}",
            style("→").dim(),
            style(if args.topology {
                "relia template --topology > topology.yaml"
            } else {
                "relia template > components.csv"
            })
            .yellow()
        );
    }
    Ok(())
}
