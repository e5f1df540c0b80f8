use clap::{Arg, Command};
use jerkalloc::logging::{LogConfig, LogOutput, init_logging, level_for_verbosity, parse_log_level};
use jerkalloc::scenario::{ScenarioConfig, parse_weight};
use jerkalloc::sweep::SweepRunner;
use tracing::error;

fn main() {
    let matches = Command::new("jerkalloc")
        .version("0.1.0")
        .about("Cross scenario jerk allocation")
        .long_about("Computes the minimum-cost jerk pair for an ego agent and an obstacle\n\
                     approaching a shared conflict point, for a sweep of obstacle cost weights.")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("Scenario file (.yaml) to run")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("Print the scenario summary and exit")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("Run the built-in cross scenario")
                .conflicts_with("scenario")
        )
        .arg(
            Arg::new("weight")
                .short('w')
                .long("weight")
                .value_name("W")
                .value_parser(parse_weight)
                .allow_negative_numbers(true)
                .action(clap::ArgAction::Append)
                .help("Obstacle cost weight to evaluate (repeatable, replaces the scenario sweep)")
        )
        .arg(
            Arg::new("yaml")
                .long("yaml")
                .action(clap::ArgAction::SetTrue)
                .help("Print the sweep report as YAML")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("Verbosity (-v: info, -vv: debug, -vvv: trace)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error); overrides -v")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .value_parser(clap::value_parser!(LogOutput))
                .default_value("console")
                .help("Log destination (console, file, both)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| level_for_verbosity(verbose_level)),
        output: *matches
            .get_one::<LogOutput>("log-output")
            .unwrap_or(&LogOutput::Console),
        ..LogConfig::default()
    };
    let _guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let scenario = if matches.get_flag("test") {
        ScenarioConfig::cross_default()
    } else if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match ScenarioConfig::from_file(scenario_path) {
            Ok(scenario) => scenario,
            Err(e) => {
                error!("{}", e);
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
        return;
    };

    if matches.get_flag("info") {
        scenario.print_summary();
        return;
    }

    let weights: Option<Vec<f64>> = matches
        .get_many::<f64>("weight")
        .map(|values| values.copied().collect());

    if let Err(e) = run_sweep(scenario, weights, matches.get_flag("yaml"), verbose_level) {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// シナリオの重みスイープを実行して結果を表示
fn run_sweep(
    scenario: ScenarioConfig,
    weights: Option<Vec<f64>>,
    as_yaml: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    if !as_yaml {
        println!("=== Cross Scenario Jerk Optimization ===");
        scenario.print_summary();
        println!();
    }

    let mut runner = SweepRunner::new(scenario, verbose_level);
    if let Some(weights) = weights {
        runner = runner.with_weights(weights);
    }

    let report = runner.run();

    if as_yaml {
        print!("{}", serde_yaml::to_string(&report)?);
    } else {
        report.print();
    }

    Ok(())
}

fn show_default_help() {
    println!("Usage:");
    println!("  jerkalloc [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -s, --scenario <FILE>   Run a scenario file");
    println!("  -i, --info              Print scenario summary only");
    println!("  -t, --test              Run the built-in cross scenario");
    println!("  -w, --weight <W>        Obstacle cost weight (repeatable)");
    println!("      --yaml              Emit the report as YAML");
    println!("  -v, --verbose           Increase log verbosity");
    println!("  -h, --help              Show this help");
    println!();
    println!("Scenarios:");
    println!("  scenarios/cross_symmetric.yaml   - both agents 30 m out at 8 m/s");
    println!("  scenarios/cross_obstacle_ahead.yaml - obstacle closer and faster");
    println!("  scenarios/cross_degenerate.yaml  - inputs the allocator rejects");
    println!();
    println!("Examples:");
    println!("  jerkalloc --test");
    println!("  jerkalloc -s scenarios/cross_symmetric.yaml -v");
    println!("  jerkalloc -s scenarios/cross_obstacle_ahead.yaml -w 0.1 -w 10 --yaml");
}
