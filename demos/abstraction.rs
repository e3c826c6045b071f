use clap::Parser;
use log::info;

use mtdd::config::ContextConfig;
use mtdd::context::Context;
use mtdd::operator::Operator;
use mtdd::reference::NodeId;
use mtdd::types::Var;
use mtdd::value::{Value, ValueType};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of boolean variables.
    #[arg(value_name = "INT", default_value = "10")]
    n: usize,

    /// Disable the operation cache.
    #[clap(long)]
    no_cache: bool,

    /// Print the popcount diagram in DOT format.
    #[clap(long)]
    dot: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let ctx = Context::with_config(ContextConfig::default().with_cache_enabled(!args.no_cache));

    // popcount(x) = sum_i (x_i ? 1 : 0)
    let one = ctx.new_constant(1)?;
    let zero = ctx.new_constant(0)?;
    let mut vars = Vec::new();
    let mut popcount: NodeId = ctx.new_constant(0)?;
    for _ in 0..args.n {
        let x = ctx.new_variable()?;
        let v = ctx.var_node(x)?;
        let bit = ctx.apply(Operator::Ite, ValueType::Integer, &[v, one, zero])?;
        let next = ctx.apply(Operator::Add, ValueType::Integer, &[popcount, bit])?;
        for h in [v, bit, popcount] {
            ctx.release(h)?;
        }
        popcount = next;
        vars.push(x);
    }
    println!("popcount over {} variables: {} nodes", args.n, ctx.size(popcount));

    let all = ctx.cube(&vars)?;
    let total = ctx.abstract_sum(popcount, all)?;
    let max = ctx.abstract_max(popcount, all)?;
    let min = ctx.abstract_min(popcount, all)?;

    // Expected popcount under the uniform distribution.
    let states = ctx.new_constant(Value::integer(1i64 << args.n.min(62)))?;
    let mean = ctx.apply(Operator::Divide, ValueType::Rational, &[total, states])?;

    // Popcount with the first half of the variables summed out.
    let half: Vec<Var> = vars.iter().copied().take(args.n / 2).collect();
    let half_cube = ctx.cube(&half)?;
    let partial = ctx.abstract_sum(popcount, half_cube)?;

    println!("sum  = {}", ctx.leaf_value(total).map(|v| v.to_string()).unwrap_or_default());
    println!("max  = {}", ctx.leaf_value(max).map(|v| v.to_string()).unwrap_or_default());
    println!("min  = {}", ctx.leaf_value(min).map(|v| v.to_string()).unwrap_or_default());
    println!("mean = {}", ctx.leaf_value(mean).map(|v| v.to_string()).unwrap_or_default());
    println!(
        "partial sum over {} variables: {} nodes, support {:?}",
        half.len(),
        ctx.size(partial),
        ctx.support(partial)
    );

    if args.dot {
        println!("{}", ctx.to_dot(&[popcount])?);
    }

    for h in [one, zero, popcount, all, total, max, min, states, mean, half_cube, partial] {
        ctx.release(h)?;
    }
    ctx.check_consistent()?;

    info!("stats: {:?}", ctx.stats());
    let time_total = time_total.elapsed();
    println!("Done in {:.2} s", time_total.as_secs_f64());

    Ok(())
}
