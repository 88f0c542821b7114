use clap::Parser;
use placesim::{
    core::{Action, EnvConfig, EnvState, PlacementEnv},
    impls::predictor,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of pods (aggregation switches)
    #[arg(short, long, default_value_t = 4)]
    pods: usize,

    /// Servers per pod
    #[arg(long, default_value_t = 4)]
    servers_per_pod: usize,

    /// Number of containers
    #[arg(short, long, default_value_t = 20)]
    containers: usize,

    /// Number of placement steps
    #[arg(short = 'n', long, default_value_t = 50)]
    steps: usize,

    /// Random seed
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Attach the EWMA traffic predictor
    #[arg(long, default_value_t = false)]
    with_predictor: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.containers >= 2, "need at least two containers");

    let config = EnvConfig::builder()
        .num_pods(args.pods)
        .servers_per_pod(args.servers_per_pod)
        .num_containers(args.containers)
        .chains(EnvConfig::default_chains(args.containers))
        .seed(Some(args.seed))
        .build();
    let mut env = PlacementEnv::new(config)?;
    if args.with_predictor {
        env.attach_predictor(predictor::default_predictor(args.containers));
    }
    env.reset(Some(args.seed));

    let initial_cost = env.network_cost();
    let mut final_info = None;
    for _ in 0..args.steps {
        let action = greedy_action(&env);
        let outcome = env.step(action)?;
        final_info = Some(outcome.info);
    }

    println!("initial network cost: {initial_cost:.1}");
    if let Some(info) = final_info {
        println!("final network cost:   {:.1}", info.network_cost);
        println!("final energy cost:    {:.1}", info.energy_cost);
        println!("final risk penalty:   {:.1}", info.risk_penalty);
        println!("final reward:         {:.1}", -info.total_cost);
    }
    summarize(&env.get_current_state());
    Ok(())
}

/// Picks the ordered pair contributing the most to the network cost and
/// moves its source onto its destination's server. Falls back to a no-op
/// re-placement of container 0 when nothing is flowing.
fn greedy_action(env: &PlacementEnv) -> Action {
    let fabric = env.fabric();
    let hottest = env
        .traffic()
        .matrix()
        .iter()
        .filter_map(|((src, dst), volume)| {
            let a = fabric.host_of(src)?;
            let b = fabric.host_of(dst)?;
            let cost = volume * fabric.distance(a, b) as f64;
            (cost > 0.0).then_some((src, b, cost))
        })
        .max_by(|x, y| x.2.total_cmp(&y.2));
    match hottest {
        Some((container, target, _)) => {
            let server = fabric
                .servers()
                .iter()
                .position(|&s| s == target)
                .expect("host is always a known server");
            Action {
                container: container.inner(),
                server,
            }
        }
        None => {
            let host = fabric
                .host_of(placesim::core::ContainerId::ZERO)
                .expect("container 0 is placed");
            let server = fabric
                .servers()
                .iter()
                .position(|&s| s == host)
                .expect("host is always a known server");
            Action {
                container: 0,
                server,
            }
        }
    }
}

fn summarize(state: &EnvState) {
    println!(
        "step {}: {} nodes, {} active servers, active chains: {:?}",
        state.step,
        state.fabric.nodes.len(),
        state.active_servers.len(),
        state.active_chains,
    );
}
